use crate::error::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OtherError {
    #[error("Required environment variable `{0}` is not set")]
    MissingEnvVar(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(OtherError::from(value))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(value: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(OtherError::from(value))
    }
}
