pub mod rule;
pub mod runner;
pub mod table;
pub mod types;

pub use rule::*;
pub use runner::*;
pub use table::*;
pub use types::*;
