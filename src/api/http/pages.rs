//! The `pages` blueprint.

use crate::api::core::health::{HealthCheckResponse, health_check};
use crate::api::http::Blueprint;
use crate::app::context::AppContext;
use crate::error::{AppResult, Error};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use minijinja::{Environment, context};
use serde_derive::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{error, instrument};

pub const BLUEPRINT: &str = "pages";
pub const INDEX: &str = "pages.index";
pub const PING: &str = "pages.ping";
pub const HEALTH: &str = "pages.health";

pub fn blueprint() -> Blueprint {
    Blueprint::new(BLUEPRINT, "/")
        .route("index", "/", get(index))
        .route("ping", "/_ping", get(ping_get))
        .route("health", "/_health", get(health_get))
}

/// An error returned from a page handler. When the app is in testing mode, the error message is
/// included in the response body.
pub struct PageError {
    error: Error,
    testing: bool,
}

impl PageError {
    fn new(context: &AppContext, error: impl Into<Error>) -> Self {
        Self {
            error: error.into(),
            testing: context.config().app.testing,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!("An error occurred while handling a request: {}", self.error);
        if self.testing {
            (StatusCode::INTERNAL_SERVER_ERROR, self.error.to_string()).into_response()
        } else {
            self.error.into_response()
        }
    }
}

#[instrument(skip_all)]
async fn index(State(context): State<AppContext>) -> Result<Html<String>, PageError> {
    let db = context.db();
    let names = db
        .collection_names()
        .await
        .map_err(|err| PageError::new(&context, err))?;

    let mut collections = Vec::with_capacity(names.len());
    for name in names {
        let count = db
            .estimated_count(&name)
            .await
            .map_err(|err| PageError::new(&context, err))?;
        collections.push(CollectionCount { name, count });
    }

    let html = render_index(&context.config().app.name, db.name(), collections)
        .map_err(|err| PageError::new(&context, err))?;
    Ok(Html(html))
}

/// A collection shown on the index page.
#[derive(Debug, Clone, Serialize)]
struct CollectionCount {
    name: String,
    count: u64,
}

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_loader(|name| {
        Ok(match name {
            INDEX_TEMPLATE => Some(include_str!("templates/index.html").to_owned()),
            _ => None,
        })
    });
    env
});

const INDEX_TEMPLATE: &str = "index.html";

fn render_index(
    title: &str,
    database: &str,
    collections: Vec<CollectionCount>,
) -> AppResult<String> {
    let html = TEMPLATES.get_template(INDEX_TEMPLATE)?.render(context! {
        title,
        database,
        collections,
    })?;
    Ok(html)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PingResponse {}

#[instrument(skip_all)]
async fn ping_get() -> Json<PingResponse> {
    Json(PingResponse::default())
}

#[instrument(skip_all)]
async fn health_get(
    State(context): State<AppContext>,
) -> Result<(StatusCode, Json<HealthCheckResponse>), PageError> {
    let timeout = context.config().database.server_selection_timeout;
    let response = health_check(&context, Some(timeout))
        .await
        .map_err(|err| PageError::new(&context, err))?;
    let status = if response.healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::Db;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use insta::assert_snapshot;
    use rstest::rstest;
    use tower::ServiceExt;

    async fn context(testing: bool) -> AppContext {
        let mut config = AppConfig::test(None).unwrap();
        config.app.testing = testing;
        config.database.server_selection_timeout = std::time::Duration::from_millis(50);
        let db = Db::connect(&config.database).await.unwrap();
        AppContext::new(config, db)
    }

    async fn get(context: AppContext, path: &str) -> (StatusCode, String) {
        let router = blueprint().into_router().with_state(context);
        let response = router
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn blueprint_routes() {
        let blueprint = blueprint();
        let routes: Vec<(&str, &str)> = blueprint
            .routes()
            .iter()
            .map(|route| (route.endpoint.as_str(), route.path.as_str()))
            .collect();

        assert_eq!(
            routes,
            [(INDEX, "/"), (PING, "/_ping"), (HEALTH, "/_health")]
        );
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn ping() {
        let (status, body) = get(context(false).await, "/_ping").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn health_unreachable_db() {
        let (status, body) = get(context(false).await, "/_health").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains(r#""db""#));
    }

    #[rstest]
    #[case(true, true)]
    #[case(false, false)]
    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn index_error_body(#[case] testing: bool, #[case] has_message: bool) {
        let (status, body) = get(context(testing).await, "/").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(!body.is_empty(), has_message);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn render_index_collections() {
        let collections = vec![
            CollectionCount {
                name: "cruises".to_owned(),
                count: 2,
            },
            CollectionCount {
                name: "<script>".to_owned(),
                count: 0,
            },
        ];

        let html = render_index("mongo-pages", "testdb", collections).unwrap();

        assert_snapshot!(html);
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn render_index_empty() {
        let html = render_index("mongo-pages", "testdb", Vec::new()).unwrap();

        assert!(html.contains("<p>No collections</p>"));
        assert!(!html.contains("<ul>"));
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn render_index_escapes_names() {
        let html = render_index("<b>pages</b>", "a&b", Vec::new()).unwrap();

        assert!(html.contains("<title>&lt;b&gt;pages"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("<h1>a&amp;b</h1>"));
    }
}
