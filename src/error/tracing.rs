use crate::error::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TracingError {
    /// An error that occurs during tracing initialization.
    #[error(transparent)]
    Init(#[from] TracingInitError),

    /// An error that occurs while building the telemetry exporter.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Other(#[from] Box<dyn Send + Sync + std::error::Error>),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TracingInitError {
    #[error(transparent)]
    ParseLevel(#[from] tracing::metadata::ParseLevelError),

    #[error(transparent)]
    ParseFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    FilterFromEnv(#[from] tracing_subscriber::filter::FromEnvError),

    #[error(transparent)]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Malformed telemetry connection string segment `{0}`; expected `Key=Value`")]
    MalformedSegment(String),

    #[error("Invalid telemetry ingestion endpoint `{endpoint}`: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[cfg(feature = "otel")]
    #[error(transparent)]
    ExporterBuilder(#[from] opentelemetry_otlp::ExporterBuildError),
}

#[cfg(feature = "otel")]
impl From<opentelemetry_otlp::ExporterBuildError> for Error {
    fn from(value: opentelemetry_otlp::ExporterBuildError) -> Self {
        Self::Tracing(TracingError::from(TelemetryError::from(value)))
    }
}

impl From<TelemetryError> for Error {
    fn from(value: TelemetryError) -> Self {
        Self::Tracing(TracingError::from(value))
    }
}

impl From<tracing::metadata::ParseLevelError> for Error {
    fn from(value: tracing::metadata::ParseLevelError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}

impl From<tracing_subscriber::filter::ParseError> for Error {
    fn from(value: tracing_subscriber::filter::ParseError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}

impl From<tracing_subscriber::filter::FromEnvError> for Error {
    fn from(value: tracing_subscriber::filter::FromEnvError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}

impl From<tracing_subscriber::util::TryInitError> for Error {
    fn from(value: tracing_subscriber::util::TryInitError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}
