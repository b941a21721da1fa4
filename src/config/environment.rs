#[cfg(feature = "cli")]
use clap::ValueEnum;
use serde_derive::{Deserialize, Serialize};
use std::env;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// The env var whose presence selects the [`Environment::Production`] profile. Its value is
/// ignored.
pub const RUNNING_IN_PRODUCTION_ENV_VAR: &str = "RUNNING_IN_PRODUCTION";

/// The configuration profile to load. Exactly one profile is selected before the app connects to
/// the database.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
#[non_exhaustive]
pub enum Environment {
    #[default]
    #[strum(to_string = "development", serialize = "dev")]
    #[cfg_attr(feature = "cli", value(alias = "dev"))]
    Development,
    #[strum(to_string = "production", serialize = "prod")]
    #[cfg_attr(feature = "cli", value(alias = "prod"))]
    Production,
}

impl Environment {
    /// Select the environment from the current process's env vars: [`Environment::Production`]
    /// if [`RUNNING_IN_PRODUCTION_ENV_VAR`] is set (to any value), otherwise
    /// [`Environment::Development`].
    ///
    /// This is intended to be called by the entrypoint; [`crate::app::App::new`] never senses
    /// the environment itself.
    // This runs before tracing is initialized, so we need to use `println` in order to
    // log from this method.
    #[allow(clippy::disallowed_macros)]
    pub fn from_env() -> Self {
        let environment =
            Self::from_production_flag(env::var_os(RUNNING_IN_PRODUCTION_ENV_VAR).is_some());
        println!("Using environment from `{RUNNING_IN_PRODUCTION_ENV_VAR}` env var: {environment}");
        environment
    }

    pub fn from_production_flag(running_in_production: bool) -> Self {
        if running_in_production {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// The embedded TOML profile for this environment.
    pub(crate) fn profile(&self) -> &'static str {
        match self {
            Environment::Development => include_str!("development.toml"),
            Environment::Production => include_str!("production.toml"),
        }
    }
}
