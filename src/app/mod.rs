//! The application factory.

pub mod context;

use crate::api::http::RouteRegistry;
use crate::api::http::pages;
use crate::app::context::AppContext;
use crate::config::environment::Environment;
use crate::config::{AppConfig, ConfigOverrides};
use crate::db::Db;
use crate::error::AppResult;
use crate::service::http::middleware;
#[cfg(feature = "otel")]
use crate::tracing::telemetry::Telemetry;
use axum::Router;
use bon::Builder;
use std::path::PathBuf;
use tracing::{info, instrument};
use url::Url;

/// Options for building an [`App`]. The environment is always chosen by the caller; the factory
/// does not inspect the process environment to select it.
///
/// # Examples
///
/// ```rust
/// # use mongo_pages::app::AppOptions;
/// # use mongo_pages::config::ConfigOverrides;
/// # use mongo_pages::config::environment::Environment;
/// let options = AppOptions::builder()
///     .environment(Environment::Development)
///     .overrides(ConfigOverrides::default().set("app.testing", true))
///     .build();
/// ```
#[derive(Debug, Clone, Default, Builder)]
#[non_exhaustive]
pub struct AppOptions {
    #[builder(default)]
    pub environment: Environment,
    /// Directory containing optional `default.toml` and `{environment}.toml` config files.
    /// Defaults to `config/`.
    #[builder(into)]
    pub config_dir: Option<PathBuf>,
    /// Merged over the loaded config.
    pub overrides: Option<ConfigOverrides>,
    /// Install the global tracing subscriber as soon as the config is loaded, so the factory's
    /// own events are recorded. Only one app per process can do this.
    #[builder(default)]
    pub init_tracing: bool,
}

/// A fully wired app: config loaded, database connected, routes registered and middleware
/// installed.
pub struct App {
    context: AppContext,
    routes: RouteRegistry,
    router: Router,
    middleware: Vec<&'static str>,
    #[cfg(feature = "otel")]
    telemetry: Option<Telemetry>,
}

impl App {
    /// Build the app for the given options. Each call opens a new database connection.
    pub async fn new(options: AppOptions) -> AppResult<Self> {
        let config = AppConfig::load(
            options.environment,
            options.config_dir.as_deref(),
            options.overrides.as_ref(),
        )?;
        Self::build(config, options.init_tracing).await
    }

    /// Build the app from an already-loaded config.
    pub async fn with_config(config: AppConfig) -> AppResult<Self> {
        Self::build(config, false).await
    }

    #[instrument(skip_all)]
    async fn build(config: AppConfig, init_tracing: bool) -> AppResult<Self> {
        #[cfg(feature = "otel")]
        let telemetry = if config.environment.is_production() {
            Some(Telemetry::new(&config)?)
        } else {
            None
        };

        if init_tracing {
            #[cfg(feature = "otel")]
            crate::tracing::init_tracing(&config, telemetry.as_ref())?;
            #[cfg(not(feature = "otel"))]
            crate::tracing::init_tracing(&config)?;
        }

        config.validate(true)?;

        let db = Db::connect(&config.database).await?;
        info!(environment=%config.environment, database=%db.name(), "Connected to database");
        let context = AppContext::new(config, db);

        let mut routes = RouteRegistry::default();
        let pages = pages::blueprint();
        routes.register(&pages)?;
        let router = Router::new().merge(pages.into_router());

        let (router, middleware) =
            middleware::install(router, &context, middleware::default_middleware())?;
        let router = router.with_state(context.clone());

        Ok(Self {
            context,
            routes,
            router,
            middleware,
            #[cfg(feature = "otel")]
            telemetry,
        })
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn config(&self) -> &AppConfig {
        self.context.config()
    }

    /// The app's router, ready to serve.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    /// The path of the named route, e.g. `/` for `pages.index`.
    pub fn url_for(&self, endpoint: &str) -> AppResult<&str> {
        self.routes.url_for(endpoint)
    }

    /// The absolute URL of the named route on a server at `base`.
    pub fn external_url_for(&self, endpoint: &str, base: &Url) -> AppResult<Url> {
        self.routes.external_url_for(endpoint, base)
    }

    /// Names of the installed middleware, in the order they run for a request.
    pub fn middleware(&self) -> &[&'static str] {
        &self.middleware
    }

    #[cfg(feature = "otel")]
    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_ref()
    }

    /// Flush any buffered telemetry.
    pub fn shutdown(&self) {
        #[cfg(feature = "otel")]
        if let Some(telemetry) = self.telemetry.as_ref() {
            telemetry.shutdown();
        }
    }
}
