//! External collaborators for the landing engine.
//!
//! Each provider sits behind an async trait so the worker crate can be
//! exercised with in-memory doubles:
//! - [`Completion`]: hosted LLM (chat replies, session analysis)
//! - [`GeoLocator`]: IP geolocation
//! - [`Mailer`]: alert delivery over SMTP

pub mod config;
pub mod geo;
pub mod health;
pub mod llm;
pub mod mailer;

pub use config::*;
pub use geo::*;
pub use llm::*;
pub use mailer::*;
