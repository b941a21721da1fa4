//! Trace export for the production environment.
//!
//! The exporter is configured with a connection string of semicolon-separated `Key=Value` pairs,
//! e.g. `InstrumentationKey=00000000-0000-0000-0000-000000000000;IngestionEndpoint=https://example.com/`.
//! `IngestionEndpoint` is the base URL of an OTLP/HTTP collector. Unknown keys are ignored.

use crate::error::tracing::TelemetryError;
use std::collections::BTreeMap;
use std::str::FromStr;
use url::Url;

pub const INGESTION_ENDPOINT_KEY: &str = "IngestionEndpoint";
pub const INSTRUMENTATION_KEY_KEY: &str = "InstrumentationKey";
/// The resource attribute the instrumentation key is exported as.
pub const INSTRUMENTATION_KEY_ATTRIBUTE: &str = "instrumentation.key";

const TRACES_PATH: &str = "v1/traces";

/// Every production trace is sampled.
pub const SAMPLING_RATIO: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    values: BTreeMap<String, String>,
    ingestion_endpoint: Option<Url>,
}

impl ConnectionString {
    /// Look up a value by key. Keys are case-insensitive.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn instrumentation_key(&self) -> Option<&str> {
        self.get(INSTRUMENTATION_KEY_KEY)
    }

    pub fn ingestion_endpoint(&self) -> Option<&Url> {
        self.ingestion_endpoint.as_ref()
    }

    /// The OTLP/HTTP traces endpoint under the ingestion endpoint.
    pub fn traces_endpoint(&self) -> Option<Url> {
        let mut base = self.ingestion_endpoint.clone()?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(TRACES_PATH).ok()
    }
}

impl FromStr for ConnectionString {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(';')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                segment
                    .split_once('=')
                    .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
                    .filter(|(key, _)| !key.is_empty())
                    .ok_or_else(|| TelemetryError::MalformedSegment(segment.to_owned()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let mut connection_string = Self {
            values,
            ingestion_endpoint: None,
        };

        connection_string.ingestion_endpoint = connection_string
            .get(INGESTION_ENDPOINT_KEY)
            .map(|endpoint| {
                Url::parse(endpoint).map_err(|source| TelemetryError::InvalidEndpoint {
                    endpoint: endpoint.to_owned(),
                    source,
                })
            })
            .transpose()?;

        Ok(connection_string)
    }
}

#[cfg(feature = "otel")]
pub use provider::Telemetry;

#[cfg(feature = "otel")]
mod provider {
    use super::{ConnectionString, INSTRUMENTATION_KEY_ATTRIBUTE, SAMPLING_RATIO};
    use crate::config::AppConfig;
    use crate::error::AppResult;
    use opentelemetry::KeyValue;
    use opentelemetry::trace::TracerProvider;
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
    use std::fmt::{Debug, Formatter};
    use tracing::{info, warn};

    /// The trace provider that exports spans recorded by the app.
    pub struct Telemetry {
        provider: SdkTracerProvider,
        connection_string: Option<ConnectionString>,
    }

    impl Telemetry {
        /// Build the trace provider from the `telemetry` config. If no connection string is
        /// configured, or it has no ingestion endpoint, spans are sampled but not exported.
        pub fn new(config: &AppConfig) -> AppResult<Self> {
            let connection_string = config
                .telemetry
                .connection_string
                .as_deref()
                .map(str::parse::<ConnectionString>)
                .transpose()?;

            let mut resource = Resource::builder().with_service_name(config.app.name.clone());
            if let Some(key) = connection_string
                .as_ref()
                .and_then(ConnectionString::instrumentation_key)
            {
                resource = resource
                    .with_attribute(KeyValue::new(INSTRUMENTATION_KEY_ATTRIBUTE, key.to_owned()));
            }

            let mut builder = SdkTracerProvider::builder()
                .with_sampler(Sampler::TraceIdRatioBased(SAMPLING_RATIO))
                .with_resource(resource.build());

            match connection_string
                .as_ref()
                .and_then(ConnectionString::traces_endpoint)
            {
                Some(endpoint) => {
                    info!(%endpoint, "Exporting traces");
                    let exporter = SpanExporter::builder()
                        .with_http()
                        .with_endpoint(endpoint.as_str())
                        .build()?;
                    builder = builder.with_batch_exporter(exporter);
                }
                None => {
                    warn!("No telemetry ingestion endpoint is configured; traces will not be exported");
                }
            }

            Ok(Self {
                provider: builder.build(),
                connection_string,
            })
        }

        pub fn tracer(&self, name: impl Into<String>) -> SdkTracer {
            self.provider.tracer(name.into())
        }

        pub fn provider(&self) -> &SdkTracerProvider {
            &self.provider
        }

        pub fn connection_string(&self) -> Option<&ConnectionString> {
            self.connection_string.as_ref()
        }

        pub fn sampling_ratio(&self) -> f64 {
            SAMPLING_RATIO
        }

        /// Flush any pending spans and stop the exporter.
        pub fn shutdown(&self) {
            if let Err(err) = self.provider.shutdown() {
                warn!("An error occurred while shutting down the trace provider: {err}");
            }
        }
    }

    impl Debug for Telemetry {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Telemetry")
                .field("connection_string", &self.connection_string)
                .finish()
        }
    }
}
