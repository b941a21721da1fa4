use serde_derive::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct Service {
    #[validate(nested)]
    pub http: HttpService,
}

#[serde_as]
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct HttpService {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    /// How long to wait for in-flight requests to finish after a shutdown signal is received.
    #[serde(default = "HttpService::default_shutdown_timeout")]
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub shutdown_timeout: Duration,
}

impl HttpService {
    pub fn url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn default_shutdown_timeout() -> Duration {
        Duration::from_millis(5_000)
    }
}
