//! Host hook protocol: JSON request in, JSON response out.

pub mod reason;
pub mod request;
pub mod response;

pub use reason::*;
pub use request::*;
pub use response::*;
