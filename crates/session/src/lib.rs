pub mod controller;
pub mod draw;
pub mod snapshot;

pub use controller::*;
pub use draw::*;
pub use snapshot::*;
