pub mod error;
pub mod memory;
pub mod state;
pub mod traits;

pub use error::*;
pub use memory::*;
pub use state::*;
pub use traits::*;
