pub mod http;
pub(crate) mod runner;
