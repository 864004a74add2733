//! HTTP API layer for the landing engine.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AdminAuth, AppState};
