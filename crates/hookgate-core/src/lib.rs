pub mod actor;
pub mod engine;
pub mod error;
pub mod ids;
pub mod model;
pub mod outcomes;
pub mod policy;
pub mod routes;
pub mod snapshot;
pub mod time;
pub mod types;

pub use actor::*;
pub use engine::*;
pub use error::*;
pub use ids::*;
pub use model::*;
pub use outcomes::*;
pub use policy::*;
pub use routes::*;
pub use snapshot::*;
pub use types::*;
