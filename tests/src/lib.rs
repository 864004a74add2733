//! Shared harness for the landing engine integration tests.

pub mod fixtures;
pub mod mocks;
pub mod setup;
