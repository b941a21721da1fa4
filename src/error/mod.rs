pub mod cli;
pub mod config;
pub mod db;
pub mod other;
pub mod parse;
pub mod reqwest;
pub mod route;
pub mod seed;
pub mod serde;
pub mod tokio;
pub mod tracing;

#[cfg(feature = "cli")]
use crate::error::cli::CliError;
use crate::error::config::ConfigError;
use crate::error::db::DbError;
use crate::error::other::OtherError;
use crate::error::parse::ParseError;
use crate::error::reqwest::ReqwestError;
use crate::error::route::RouteError;
use crate::error::seed::SeedError;
use crate::error::serde::SerdeError;
use crate::error::tokio::TokioError;
use crate::error::tracing::TracingError;
use ::axum::http::StatusCode;
use ::axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use thiserror::Error;

pub type AppResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Serde(#[from] SerdeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tokio(#[from] TokioError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    #[error(transparent)]
    Reqwest(#[from] ReqwestError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[cfg(feature = "cli")]
    #[error(transparent)]
    Clap(#[from] clap::error::Error),

    #[cfg(feature = "cli")]
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Infallible(#[from] Infallible),

    #[cfg(feature = "test-containers")]
    #[error(transparent)]
    TestContainers(
        #[from] testcontainers_modules::testcontainers::core::error::TestcontainersError,
    ),

    #[error(transparent)]
    Other(#[from] OtherError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        ::tracing::debug!("{}", self);
        match self {
            Error::Route(RouteError::UnknownEndpoint(_)) => StatusCode::NOT_FOUND.into_response(),
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
