use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RouteError {
    #[error("No route is registered for endpoint `{0}`")]
    UnknownEndpoint(String),

    #[error("Route `{0}` is registered more than once")]
    DuplicateEndpoint(String),
}
