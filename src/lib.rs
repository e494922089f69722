mod locomotion;
mod animation;

pub use animation::*;
pub use locomotion::*;
mod input_plugin;
pub use input_plugin::*;
mod camera_plugin;
pub use camera_plugin::*;
