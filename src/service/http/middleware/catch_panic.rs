use crate::app::context::AppContext;
use crate::error::AppResult;
use crate::service::http::middleware::Middleware;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

/// Converts a panic in a request handler into a `500` response instead of dropping the
/// connection.
pub struct CatchPanicMiddleware;

impl Middleware for CatchPanicMiddleware {
    fn name(&self) -> &'static str {
        "catch-panic"
    }

    fn enabled(&self, _context: &AppContext) -> bool {
        true
    }

    fn priority(&self, _context: &AppContext) -> i32 {
        0
    }

    fn install(
        &self,
        router: Router<AppContext>,
        _context: &AppContext,
    ) -> AppResult<Router<AppContext>> {
        Ok(router.layer(CatchPanicLayer::new()))
    }
}
