pub mod clock;
pub mod duration;

pub use clock::*;
pub use duration::*;
