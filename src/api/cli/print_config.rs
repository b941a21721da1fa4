use crate::api::cli::RunCommand;
use crate::app::App;
use crate::config::AppConfig;
use crate::error::AppResult;
use async_trait::async_trait;
use clap::Parser;
use serde_derive::{Deserialize, Serialize};
use strum_macros::{EnumString, IntoStaticStr};
use tracing::info;

#[derive(Debug, Parser, Serialize)]
#[non_exhaustive]
pub struct PrintConfigArgs {
    /// Print the config with the specified format.
    #[clap(short, long, default_value = "debug")]
    pub format: Format,
}

#[derive(
    Debug, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, IntoStaticStr, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case", tag = "type")]
#[strum(serialize_all = "kebab-case")]
#[non_exhaustive]
pub enum Format {
    Debug,
    Json,
    JsonPretty,
    Toml,
    TomlPretty,
}

#[async_trait]
impl RunCommand for PrintConfigArgs {
    async fn run(&self, app: &App) -> AppResult<()> {
        let serialized = serialize_config(&self.format, app.config())?;

        info!("\n{}", serialized);

        Ok(())
    }
}

fn serialize_config(format: &Format, config: &AppConfig) -> AppResult<String> {
    let serialized = match format {
        Format::Debug => {
            format!("{:?}", config)
        }
        Format::Json => serde_json::to_string(config)?,
        Format::JsonPretty => serde_json::to_string_pretty(config)?,
        Format::Toml => toml::to_string(config)?,
        Format::TomlPretty => toml::to_string_pretty(config)?,
    };
    Ok(serialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn config() -> AppConfig {
        AppConfig::test(None).unwrap()
    }

    #[rstest]
    #[case(Format::Json)]
    #[case(Format::JsonPretty)]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn serialize_config_json(config: AppConfig, #[case] format: Format) {
        let serialized = super::serialize_config(&format, &config).unwrap();

        let value: serde_json::Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(value["environment"], "development");
        assert_eq!(value["database"]["uri"], "mongodb://invalid_host:27017/example_test");
        assert_eq!(value["app"]["testing"], true);
    }

    #[rstest]
    #[case(Format::Toml)]
    #[case(Format::TomlPretty)]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn serialize_config_toml(config: AppConfig, #[case] format: Format) {
        let serialized = super::serialize_config(&format, &config).unwrap();

        let value: toml::Table = toml::from_str(&serialized).unwrap();
        assert_eq!(value["environment"].as_str(), Some("development"));
        assert_eq!(value["seed"]["filename"].as_str(), Some("seed_data.json"));
    }

    #[rstest]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn serialize_config_debug(config: AppConfig) {
        let serialized = super::serialize_config(&Format::Debug, &config).unwrap();

        assert!(serialized.starts_with("AppConfig {"));
    }
}
