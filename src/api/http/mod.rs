use crate::app::context::AppContext;
use crate::error::AppResult;
use crate::error::route::RouteError;
use axum::Router;
use axum::routing::MethodRouter;
use itertools::Itertools;
use std::collections::BTreeMap;
use url::Url;

pub mod pages;

/// Build an API path given a parent and child route.
///
/// The path is cleaned to make sure it is valid:
/// 1. Any occurrences of double `/` are removed, e.g. `/foo//bar`
/// 2. Any trailing `/` is removed
/// 3. The path always starts with a `/`
///
/// # Examples
/// ```rust
/// # use mongo_pages::api::http::build_path;
/// assert_eq!(build_path("/", "/"), "/");
/// assert_eq!(build_path("/pages/", "/_ping"), "/pages/_ping");
/// ```
pub fn build_path(parent: &str, child: &str) -> String {
    let path = format!("{parent}/{child}");
    let path = path.split('/').filter(|s| !s.is_empty()).join("/");
    format!("/{path}")
}

/// A named route: the endpoint name used to look it up (e.g. `pages.index`) and its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRoute {
    pub endpoint: String,
    pub path: String,
}

/// A named bundle of route handlers. Each route is registered under the endpoint name
/// `{blueprint}.{name}` so it can be resolved with [`RouteRegistry::url_for`].
pub struct Blueprint {
    name: String,
    prefix: String,
    routes: Vec<NamedRoute>,
    router: Router<AppContext>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            routes: Default::default(),
            router: Router::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route(
        mut self,
        name: &str,
        path: &str,
        method_router: MethodRouter<AppContext>,
    ) -> Self {
        let path = build_path(&self.prefix, path);
        self.routes.push(NamedRoute {
            endpoint: format!("{}.{name}", self.name),
            path: path.clone(),
        });
        self.router = self.router.route(&path, method_router);
        self
    }

    pub fn routes(&self) -> &[NamedRoute] {
        &self.routes
    }

    pub(crate) fn into_router(self) -> Router<AppContext> {
        self.router
    }
}

/// The app's routing table, mapping endpoint names to paths.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: BTreeMap<String, String>,
}

impl RouteRegistry {
    /// Register the routes of a blueprint. Registering an endpoint name twice is an error.
    pub fn register(&mut self, blueprint: &Blueprint) -> AppResult<()> {
        for route in blueprint.routes() {
            if self.routes.contains_key(&route.endpoint) {
                return Err(RouteError::DuplicateEndpoint(route.endpoint.clone()).into());
            }
            self.routes
                .insert(route.endpoint.clone(), route.path.clone());
        }
        Ok(())
    }

    /// The path of the route registered for `endpoint`.
    pub fn url_for(&self, endpoint: &str) -> AppResult<&str> {
        self.routes
            .get(endpoint)
            .map(String::as_str)
            .ok_or_else(|| RouteError::UnknownEndpoint(endpoint.to_owned()).into())
    }

    /// The absolute URL of the route registered for `endpoint`, relative to `base`.
    pub fn external_url_for(&self, endpoint: &str, base: &Url) -> AppResult<Url> {
        let path = self.url_for(endpoint)?;
        Ok(base.join(path)?)
    }

    /// All named routes, ordered by endpoint name.
    pub fn iter(&self) -> impl Iterator<Item = NamedRoute> + '_ {
        self.routes.iter().map(|(endpoint, path)| NamedRoute {
            endpoint: endpoint.clone(),
            path: path.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
