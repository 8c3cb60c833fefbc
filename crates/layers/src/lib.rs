pub mod registry;
pub mod role;
pub mod symbology;
pub mod weather;

pub use registry::*;
pub use role::*;
pub use symbology::*;
pub use weather::*;
