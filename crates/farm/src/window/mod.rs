mod gui;
mod state;
mod traits;

pub use gui::*;
pub use state::*;
pub use traits::*;
