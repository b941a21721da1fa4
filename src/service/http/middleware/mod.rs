pub mod catch_panic;
pub mod tracing;

use crate::app::context::AppContext;
use crate::error::AppResult;
use axum::Router;
use itertools::Itertools;

/// Allows installing middleware on the app's [Router].
///
/// The order in which middleware runs matters. Because of how axum's [Router::layer] method
/// installs middleware, the order in which middleware is installed is the reverse of the order it
/// will run when handling a request. [`install`] takes care of this based on
/// [`Middleware::priority`].
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;
    fn enabled(&self, context: &AppContext) -> bool;
    /// Smaller numbers run before larger numbers when handling a request.
    fn priority(&self, context: &AppContext) -> i32;
    fn install(
        &self,
        router: Router<AppContext>,
        context: &AppContext,
    ) -> AppResult<Router<AppContext>>;
}

pub fn default_middleware() -> Vec<Box<dyn Middleware>> {
    vec![
        Box::new(catch_panic::CatchPanicMiddleware),
        Box::new(tracing::TracingMiddleware),
    ]
}

/// Install the enabled middleware on the router. Returns the router and the names of the
/// installed middleware, in the order they run when handling a request.
pub(crate) fn install(
    router: Router<AppContext>,
    context: &AppContext,
    middleware: Vec<Box<dyn Middleware>>,
) -> AppResult<(Router<AppContext>, Vec<&'static str>)> {
    let middleware = middleware
        .into_iter()
        .filter(|middleware| {
            let enabled = middleware.enabled(context);
            if !enabled {
                ::tracing::debug!(middleware=%middleware.name(), "Middleware is not enabled");
            }
            enabled
        })
        .sorted_by(|a, b| Ord::cmp(&a.priority(context), &b.priority(context)))
        .collect_vec();

    let names = middleware.iter().map(|middleware| middleware.name()).collect_vec();

    let router = middleware
        .iter()
        .rev()
        .try_fold(router, |router, middleware| {
            ::tracing::info!(middleware=%middleware.name(), "Installing middleware");
            middleware.install(router, context)
        })?;

    Ok((router, names))
}
