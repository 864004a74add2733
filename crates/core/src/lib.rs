//! Core types for the landing engine: visitor sessions, the live session
//! registry, chat classification, admin auth and scroll geometry.

pub mod auth;
pub mod chat;
pub mod error;
pub mod limits;
pub mod network;
pub mod registry;
pub mod scroll;
pub mod session;
pub mod tracking;

pub use auth::*;
pub use chat::*;
pub use error::{AuthErrorCode, Error, Result, ValidationErrorCode};
pub use network::*;
pub use registry::*;
pub use session::*;
pub use tracking::*;
