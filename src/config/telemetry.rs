use serde_derive::{Deserialize, Serialize};
use validator::Validate;

/// Configuration for the telemetry exporter and middleware. Telemetry is only installed when the
/// app runs in the `production` environment.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct Telemetry {
    /// Connection string for the trace exporter, in the `Key=Value;Key=Value` format. Populated
    /// from the `APPLICATIONINSIGHTS_CONNECTION_STRING` env var when it is set.
    #[serde(default)]
    pub connection_string: Option<String>,
}
