mod camera;
mod math;
mod transform;

pub use camera::*;
pub use math::*;
pub use transform::*;
