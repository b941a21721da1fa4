pub mod middleware;

use crate::error::AppResult;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve the router on an already-bound listener until the `cancel_token` is cancelled. In-flight
/// requests are allowed to complete before this returns.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel_token: CancellationToken,
) -> AppResult<()> {
    let address = listener.local_addr()?;
    info!(%address, "Http server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(Box::pin(async move { cancel_token.cancelled().await }))
        .await?;
    info!(%address, "Http server stopped");
    Ok(())
}
