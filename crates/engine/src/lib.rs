pub mod camera;
pub mod headless;
pub mod map_engine;

pub use camera::*;
pub use headless::*;
pub use map_engine::*;
