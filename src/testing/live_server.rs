//! Serve the app over real HTTP on an ephemeral port for the duration of a test.

use crate::api::http::RouteRegistry;
use crate::api::http::pages;
use crate::app::App;
use crate::error::{AppResult, Error};
use crate::service::http::serve;
use crate::testing::fixture;
use bon::Builder;
use futures::FutureExt;
use std::net::{Ipv4Addr, SocketAddr};
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Builder)]
#[non_exhaustive]
pub struct LiveServerOptions {
    /// How long to wait for the server to answer the ping route after starting.
    #[builder(default = Duration::from_secs(10))]
    pub ready_timeout: Duration,
    /// How often to poll the ping route while waiting for the server.
    #[builder(default = Duration::from_millis(25))]
    pub poll_interval: Duration,
    /// How long to wait for in-flight requests after shutdown is requested before the server
    /// task is aborted.
    #[builder(default = Duration::from_secs(5))]
    pub grace_period: Duration,
}

impl Default for LiveServerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A running HTTP server for the app. The server task is aborted when this is dropped; call
/// [`LiveServer::shutdown`] to stop it gracefully.
pub struct LiveServer {
    address: SocketAddr,
    url: Url,
    routes: RouteRegistry,
    grace_period: Duration,
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<AppResult<()>>>,
}

impl LiveServer {
    pub async fn start(app: &App) -> AppResult<Self> {
        Self::start_with_options(app, LiveServerOptions::default()).await
    }

    /// Bind a listener to an ephemeral port on `127.0.0.1`, serve the app on it, and wait until
    /// the server answers the ping route.
    pub async fn start_with_options(app: &App, options: LiveServerOptions) -> AppResult<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let address = listener.local_addr()?;
        let url = Url::parse(&format!("http://{address}"))?;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, app.router(), cancel_token.clone()));

        let server = Self {
            address,
            url,
            routes: app.routes().clone(),
            grace_period: options.grace_period,
            cancel_token,
            handle: Some(handle),
        };

        server
            .wait_until_ready(options.ready_timeout, options.poll_interval)
            .await?;
        info!(url=%server.url, "Live server is ready");

        Ok(server)
    }

    async fn wait_until_ready(
        &self,
        ready_timeout: Duration,
        poll_interval: Duration,
    ) -> AppResult<()> {
        let ping = self.url_for(pages::PING)?;
        let client = reqwest::Client::new();
        timeout(ready_timeout, async {
            loop {
                match client.get(ping.clone()).send().await {
                    Ok(response) if response.status().is_success() => break,
                    Ok(response) => debug!(status=%response.status(), "Live server is not ready"),
                    Err(err) => debug!("Live server is not ready: {err}"),
                }
                sleep(poll_interval).await;
            }
        })
        .await?;
        Ok(())
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// The base URL of the server, e.g. `http://127.0.0.1:49152/`.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The absolute URL of a named route on this server.
    pub fn url_for(&self, endpoint: &str) -> AppResult<Url> {
        self.routes.external_url_for(endpoint, &self.url)
    }

    /// Signal the server to stop, wait up to the grace period for it to finish, then abort it.
    pub async fn shutdown(mut self) -> AppResult<()> {
        self.cancel_token.cancel();
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        match timeout(self.grace_period, &mut handle).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(url=%self.url, "Live server did not stop within the grace period; aborting");
                handle.abort();
                Ok(())
            }
        }
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel_token.cancel();
            handle.abort();
        }
    }
}

/// The absolute URL of the `pages.index` route on a server that is already running.
pub fn index_url(server: &LiveServer) -> AppResult<Url> {
    server.url_for(pages::INDEX)
}

/// Run a test against the seeded test app served on an ephemeral port. The server is shut down
/// and the test database is dropped when the test completes, even if it panics.
pub async fn run_live_test(test_fn: impl AsyncFnOnce(&App, &LiveServer)) -> AppResult<()> {
    let result = fixture::run_test_with_result(async move |app| -> Result<(), Error> {
        let server = LiveServer::start(app).await?;
        let test_result = AssertUnwindSafe(test_fn(app, &server)).catch_unwind().await;
        let shutdown_result = server.shutdown().await;
        match test_result {
            Ok(()) => shutdown_result,
            Err(panic) => resume_unwind(panic),
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err((Some(err), _)) | Err((None, Some(err))) => Err(err),
        Err((None, None)) => Ok(()),
    }
}

/// Like [`run_live_test`], for tests that don't need the [`App`] itself.
pub async fn run_live_server_test(test_fn: impl AsyncFnOnce(&LiveServer)) -> AppResult<()> {
    run_live_test(async move |_app, server| test_fn(server).await).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use crate::config::ConfigOverrides;
    use crate::error::tokio::TokioError;
    use reqwest::StatusCode;

    async fn app() -> App {
        App::new(
            AppOptions::builder()
                .config_dir("does-not-exist/")
                .overrides(
                    ConfigOverrides::default()
                        .set("database.uri", "mongodb://invalid_host:27017/example")
                        .set("database.server-selection-timeout", 50),
                )
                .build(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn serves_on_ephemeral_port() {
        let app = app().await;

        let server = LiveServer::start(&app).await.unwrap();

        assert!(server.address().ip().is_loopback());
        assert_ne!(server.address().port(), 0);
        assert_eq!(
            server.url().as_str(),
            format!("http://127.0.0.1:{}/", server.address().port())
        );
        let response = reqwest::get(server.url_for(pages::PING).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn index_url_resolves_against_server() {
        let app = app().await;
        let server = LiveServer::start(&app).await.unwrap();

        let url = index_url(&server).unwrap();

        assert_eq!(url.as_str(), server.url().as_str());
        assert_eq!(url.path(), "/");
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn shutdown_stops_server() {
        let app = app().await;
        let server = LiveServer::start(&app).await.unwrap();
        let ping = server.url_for(pages::PING).unwrap();

        server.shutdown().await.unwrap();

        assert!(reqwest::get(ping).await.is_err());
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn drop_aborts_server() {
        let app = app().await;
        let server = LiveServer::start(&app).await.unwrap();
        let ping = server.url_for(pages::PING).unwrap();

        drop(server);
        tokio::task::yield_now().await;

        let result = timeout(Duration::from_secs(5), async {
            loop {
                if reqwest::get(ping.clone()).await.is_err() {
                    break;
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn ready_timeout() {
        let app = app().await;
        let options = LiveServerOptions::builder()
            .ready_timeout(Duration::ZERO)
            .build();

        let result = LiveServer::start_with_options(&app, options).await;

        assert!(matches!(result, Err(Error::Tokio(TokioError::Timeout(_)))));
    }
}
