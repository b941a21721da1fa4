pub mod telemetry;

use crate::config::AppConfig;
use crate::config::tracing::Format;
use crate::error::AppResult;
#[cfg(feature = "otel")]
use crate::tracing::telemetry::Telemetry;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize the global tracing subscriber. Logs are written to stdout in the configured
/// [`Format`]. If `telemetry` is provided, spans are also exported through it, and its provider
/// becomes the global OpenTelemetry tracer provider.
pub fn init_tracing(
    config: &AppConfig,
    #[cfg(feature = "otel")] telemetry: Option<&Telemetry>,
) -> AppResult<()> {
    let env_filter = env_filter(config)?;

    let stdout_layer = match config.tracing.format {
        Format::None => None,
        Format::Pretty => Some(tracing_subscriber::fmt::layer().pretty().boxed()),
        Format::Compact => Some(tracing_subscriber::fmt::layer().compact().boxed()),
        Format::Json => Some(tracing_subscriber::fmt::layer().json().boxed()),
    };

    #[cfg(feature = "otel")]
    let otel_layer = telemetry.map(|telemetry| {
        opentelemetry::global::set_tracer_provider(telemetry.provider().clone());
        tracing_opentelemetry::layer().with_tracer(telemetry.tracer(config.app.name.clone()))
    });

    let registry = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(stdout_layer);

    #[cfg(feature = "otel")]
    let registry = registry.with(otel_layer);

    registry.try_init()?;

    Ok(())
}

/// Build the filter from the configured level, the `RUST_LOG` env var (if set) and the
/// configured `trace-filters`.
fn env_filter(config: &AppConfig) -> AppResult<EnvFilter> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::from_str(&config.tracing.level)?.into())
        .from_env()?;

    let env_filter = config
        .tracing
        .trace_filters
        .iter()
        .try_fold(env_filter, |env_filter, filter| {
            Ok::<_, tracing_subscriber::filter::ParseError>(
                env_filter.add_directive(filter.parse()?),
            )
        })?;

    Ok(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn env_filter_from_config() {
        let config = AppConfig::test(Some(
            r#"
            environment = "development"
            [app]
            name = "Test"
            [database]
            uri = "mongodb://localhost:27017/example"
            [tracing]
            level = "warn"
            format = "none"
            trace-filters = ["mongodb=error", "tower_http=debug"]
            "#,
        ))
        .unwrap();

        assert!(env_filter(&config).is_ok());
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn invalid_level() {
        let mut config = AppConfig::test(None).unwrap();
        config.tracing.level = "loud".to_owned();

        assert!(env_filter(&config).is_err());
    }
}
