pub mod bounds;
pub mod feature;
pub mod guard;

pub use bounds::*;
pub use feature::*;
pub use guard::*;
