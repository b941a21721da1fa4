use crate::app::context::AppContext;
use crate::error::AppResult;
use crate::service::http::middleware::Middleware;
use axum::Router;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use opentelemetry_semantic_conventions::trace::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, NETWORK_PROTOCOL_VERSION, URL_PATH,
};
use std::time::Duration;
use tower_http::trace::{DefaultOnResponse, MakeSpan, OnRequest, OnResponse, TraceLayer};
use tracing::{Level, Span, Value, event, field, info_span};

/// Records a span for every request using OpenTelemetry semantic convention field names. Only
/// installed in production, where the spans are exported by the telemetry layer.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn enabled(&self, context: &AppContext) -> bool {
        context.config().environment.is_production()
    }

    fn priority(&self, _context: &AppContext) -> i32 {
        -10
    }

    fn install(
        &self,
        router: Router<AppContext>,
        _context: &AppContext,
    ) -> AppResult<Router<AppContext>> {
        let router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(CustomMakeSpan)
                .on_request(CustomOnRequest)
                .on_response(CustomOnResponse::new()),
        );

        Ok(router)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CustomMakeSpan;

impl<B> MakeSpan<B> for CustomMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let path = get_path(request);
        info_span!("http_request",
            { HTTP_REQUEST_METHOD } = %request.method(),
            { HTTP_ROUTE } = optional_trace_field(path),
            { NETWORK_PROTOCOL_VERSION } = ?request.version(),
            // Not known until the response is created
            { HTTP_RESPONSE_STATUS_CODE } = field::Empty,
        )
    }
}

fn get_path<B>(request: &Request<B>) -> Option<&str> {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str())
}

fn optional_trace_field<T>(value: Option<T>) -> Box<dyn Value>
where
    T: ToString,
{
    value
        .map(|x| Box::new(field::display(x.to_string())) as Box<dyn Value>)
        .unwrap_or(Box::new(field::Empty))
}

#[derive(Debug, Copy, Clone)]
pub struct CustomOnRequest;

impl<B> OnRequest<B> for CustomOnRequest {
    fn on_request(&mut self, request: &Request<B>, _: &Span) {
        event!(
            Level::INFO,
            { URL_PATH } = %request.uri().path(),
            "started processing request",
        )
    }
}

#[derive(Debug, Clone)]
pub struct CustomOnResponse {
    default: DefaultOnResponse,
}

impl CustomOnResponse {
    pub fn new() -> CustomOnResponse {
        CustomOnResponse {
            default: DefaultOnResponse::new().level(Level::INFO),
        }
    }
}

impl Default for CustomOnResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> OnResponse<B> for CustomOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        span.record(HTTP_RESPONSE_STATUS_CODE, response.status().as_u16());
        self.default.on_response(response, latency, span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::config::environment::Environment;
    use crate::db::Db;
    use rstest::rstest;

    #[rstest]
    #[case(Environment::Development, false)]
    #[case(Environment::Production, true)]
    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn tracing_enabled(#[case] environment: Environment, #[case] expected_enabled: bool) {
        let mut config = AppConfig::test(None).unwrap();
        config.environment = environment;
        let db = Db::connect(&config.database).await.unwrap();
        let context = AppContext::new(config, db);

        assert_eq!(TracingMiddleware.enabled(&context), expected_enabled);
    }
}
