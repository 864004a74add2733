//! Flat-file persistence for the landing engine.
//!
//! Three JSON documents live under the data directory:
//! `visitors.json` (array of session records keyed by id),
//! `questions.json` (append-only question log) and
//! `active_sessions.json` (id → live session snapshot).

pub mod config;
pub mod files;
pub mod stats;
pub mod store;

pub use config::*;
pub use stats::*;
pub use store::*;
