mod animation;
mod assets;
mod core;
mod delta_timer;
mod drone;
mod error;
mod farm_scene;
mod fire;
mod fs;
mod inspection;
mod manifest;
mod model;
mod progress;
mod resource_manager;
mod scene;
mod timeline;
mod vehicles;

pub use animation::*;
pub use assets::*;
pub use self::core::*;
pub use delta_timer::*;
pub use drone::*;
pub use error::*;
pub use farm_scene::*;
pub use fire::*;
pub use fs::*;
pub use inspection::*;
pub use manifest::*;
pub use model::*;
pub use progress::*;
pub use resource_manager::*;
pub use scene::*;
pub use timeline::*;
pub use vehicles::*;
