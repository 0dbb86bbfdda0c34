pub mod config;
pub mod doctor;
pub mod gate;
pub mod util;

pub use config::*;
pub use doctor::*;
pub use gate::*;
pub use util::*;
