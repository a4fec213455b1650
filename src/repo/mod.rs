pub mod error;
pub mod normalize;
pub mod remote;
pub mod http;
pub mod memory;

pub use error::*;
pub use normalize::*;
pub use remote::*;
pub use http::*;
pub use memory::*;
