use crate::config::database::Database;
use crate::config::environment::Environment;
use crate::config::service::Service;
use crate::config::telemetry::Telemetry;
use crate::config::tracing::Tracing;
use crate::error::AppResult;
use ::tracing::warn;
use config::builder::DefaultState;
use config::{Case, Config, ConfigBuilder, FileFormat};
use dotenvy::dotenv;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use validator::Validate;

pub mod database;
pub mod environment;
pub mod service;
pub mod telemetry;
pub mod tracing;

pub type CustomConfig = BTreeMap<String, Value>;

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct AppConfig {
    pub environment: Environment,
    #[validate(nested)]
    pub app: App,
    #[validate(nested)]
    pub service: Service,
    #[validate(nested)]
    pub database: Database,
    #[validate(nested)]
    pub tracing: Tracing,
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: Telemetry,
    #[validate(nested)]
    pub seed: Seed,
    /// Allows providing custom config values. Any configs that aren't pre-defined above
    /// will be collected here.
    #[serde(flatten, default)]
    pub custom: CustomConfig,
}

pub const ENV_VAR_PREFIX: &str = "MONGO_PAGES";
pub const ENV_VAR_SEPARATOR: &str = "__";

/// The connection string for the production telemetry exporter is read from this env var. It
/// may be unset.
pub const TELEMETRY_CONNECTION_STRING_ENV_VAR: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";

const ENVIRONMENT_KEY: &str = "environment";
const TELEMETRY_CONNECTION_STRING_KEY: &str = "telemetry.connection-string";

impl AppConfig {
    /// Load the config for the given [`Environment`] from the embedded profiles, the
    /// `config/` directory (if it exists) and `MONGO_PAGES__*` env vars.
    pub fn new(environment: Environment) -> AppResult<Self> {
        Self::load(environment, None, None)
    }

    /// Load the config for the given [`Environment`]. Sources are applied in the following order,
    /// later sources overriding earlier ones:
    ///
    /// 1. The embedded `default.toml` profile
    /// 2. The embedded profile for the environment (`development.toml` or `production.toml`)
    /// 3. `{config_dir}/default.toml` and `{config_dir}/{environment}.toml`, if they exist
    /// 4. Env vars, e.g. `MONGO_PAGES__DATABASE__URI`
    /// 5. The `APPLICATIONINSIGHTS_CONNECTION_STRING` env var, if set
    /// 6. The `overrides`, if provided
    // This runs before tracing is initialized, so we need to use `println` in order to
    // log from this method.
    #[allow(clippy::disallowed_macros)]
    pub fn load(
        environment: Environment,
        config_dir: Option<&Path>,
        overrides: Option<&ConfigOverrides>,
    ) -> AppResult<Self> {
        dotenv().ok();

        let environment_str: &str = environment.into();

        let config = Self::profile_config(environment);

        let config_dir = config_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("config/"));
        let config = if config_dir.is_dir() {
            println!("Loading configuration from directory {config_dir:?}");
            let config = config_env_file("default", &config_dir, config);
            config_env_file(environment_str, &config_dir, config)
        } else {
            config
        };

        let config = config
            .add_source(
                config::Environment::default()
                    .prefix(ENV_VAR_PREFIX)
                    .convert_case(Case::Kebab)
                    .separator(ENV_VAR_SEPARATOR),
            )
            .set_override_option(
                TELEMETRY_CONNECTION_STRING_KEY,
                env::var(TELEMETRY_CONNECTION_STRING_ENV_VAR).ok(),
            )?
            .set_override(ENVIRONMENT_KEY, environment_str)?;

        let config = match overrides {
            Some(overrides) => overrides.apply(config)?,
            None => config,
        };

        let config: AppConfig = config.build()?.try_deserialize()?;

        Ok(config)
    }

    #[cfg(test)]
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub(crate) fn test(config_str: Option<&str>) -> AppResult<Self> {
        let config = Self::profile_config(Environment::Development)
            .add_source(config::File::from_str(
                config_str.unwrap_or(
                    r#"
                    environment = "development"

                    [app]
                    name = "Test"
                    testing = true

                    [database]
                    uri = "mongodb://invalid_host:27017/example_test"

                    [service.http]
                    host = "127.0.0.1"
                    port = 5001
                    "#,
                ),
                FileFormat::Toml,
            ))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        Ok(config)
    }

    fn profile_config(environment: Environment) -> ConfigBuilder<DefaultState> {
        Config::builder()
            .add_source(config::File::from_str(
                include_str!("default.toml"),
                FileFormat::Toml,
            ))
            .add_source(config::File::from_str(
                environment.profile(),
                FileFormat::Toml,
            ))
    }

    pub(crate) fn validate(&self, exit_on_error: bool) -> AppResult<()> {
        let result = Validate::validate(self);
        if exit_on_error {
            result?;
        } else if let Err(err) = result {
            warn!("An error occurred when validating the app config: {}", err);
        }
        Ok(())
    }
}

/// Adds a config file in the relative path `config/{environment}.toml` to the
/// [`ConfigBuilder`]. If no such file exists, does nothing.
fn config_env_file(
    environment: &str,
    config_dir: &Path,
    config: ConfigBuilder<DefaultState>,
) -> ConfigBuilder<DefaultState> {
    let path = config_dir.join(format!("{environment}.toml"));
    if !path.is_file() {
        return config;
    }

    config.add_source(config::File::from(path))
}

/// A mapping of config keys to values that is merged over the loaded [`AppConfig`]. Keys are
/// dotted paths using the same (kebab-case) names as the TOML profiles, e.g. `database.uri` or
/// `app.testing`. If the same key is inserted twice, the last value wins.
///
/// # Examples
///
/// ```rust
/// # use mongo_pages::config::ConfigOverrides;
/// let overrides = ConfigOverrides::default()
///     .set("app.testing", true)
///     .set("database.uri", "mongodb://localhost:27017/example");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    values: BTreeMap<String, config::Value>,
}

impl ConfigOverrides {
    pub fn set(mut self, key: impl Into<String>, value: impl Into<config::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<config::Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&config::Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn apply(&self, config: ConfigBuilder<DefaultState>) -> AppResult<ConfigBuilder<DefaultState>> {
        let config = self
            .values
            .iter()
            .try_fold(config, |config, (key, value)| {
                config.set_override(key.as_str(), value.clone())
            })?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct App {
    #[validate(length(min = 1))]
    pub name: String,
    /// Set by test fixtures. When enabled, internal error messages are included in HTTP error
    /// responses.
    #[serde(default)]
    pub testing: bool,
}

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct Seed {
    /// The seed file used by the `seed` CLI command if `--filename` is not provided.
    pub filename: PathBuf,
}
