#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod http;
