use crate::app::App;
use crate::error::AppResult;
use crate::service::http::serve;
use std::future::Future;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Serve the app on the configured address until a shutdown signal is received or the server
/// stops. After the signal, in-flight requests get up to `service.http.shutdown-timeout` to
/// complete before the server task is aborted.
#[instrument(skip_all)]
pub(crate) async fn run(app: &App) -> AppResult<()> {
    let http = &app.config().service.http;
    let listener = TcpListener::bind(http.url()).await?;
    let shutdown_timeout = http.shutdown_timeout;

    let cancel_token = CancellationToken::new();
    let mut join_set = JoinSet::new();

    join_set.spawn(serve(listener, app.router(), cancel_token.clone()));
    join_set.spawn(cancel_token_on_signal_received(
        graceful_shutdown_signal(cancel_token.clone()),
        cancel_token.clone(),
    ));

    // Whichever task finishes first (the server or the signal listener) triggers shutdown of
    // the other.
    if let Some(result) = join_set.join_next().await {
        log_result(result);
    }
    cancel_token.cancel();

    let remaining = timeout(shutdown_timeout, async {
        while let Some(result) = join_set.join_next().await {
            log_result(result);
        }
    })
    .await;
    if remaining.is_err() {
        warn!(
            timeout_ms = shutdown_timeout.as_millis(),
            "Shutdown timed out, aborting remaining tasks"
        );
        join_set.abort_all();
    }

    info!("Shutdown complete");

    Ok(())
}

fn log_result(result: Result<AppResult<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!("An error occurred in one of the app's tasks. Error: {err}");
        }
        Err(join_err) => {
            error!(
                "An error occurred when trying to join on one of the app's tasks. Error: {join_err}"
            );
        }
    }
}

async fn graceful_shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutting down due to ctrl-c signal received");
        },
        _ = sigterm => {
            info!("Shutting down due to sigterm signal received");
        },
        _ = cancellation_token.cancelled() => {
            info!("Shutting down due to cancellation token cancelled");
        }
    }
}

async fn cancel_token_on_signal_received<F>(
    shutdown_signal: F,
    cancellation_token: CancellationToken,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    shutdown_signal.await;
    cancellation_token.cancel();
    Ok(())
}
