//! Test fixtures and utilities. Available in this crate's tests and, with the `testing` feature,
//! to integration tests.

pub mod fixture;
pub mod live_server;
pub mod snapshot;
