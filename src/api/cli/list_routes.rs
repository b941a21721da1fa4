use crate::api::cli::RunCommand;
use crate::api::http::RouteRegistry;
use crate::app::App;
use crate::error::AppResult;
use async_trait::async_trait;
use clap::Parser;
use itertools::Itertools;
use serde_derive::Serialize;
use tracing::info;

#[derive(Debug, Parser, Serialize)]
#[non_exhaustive]
pub struct ListRoutesArgs {}

#[async_trait]
impl RunCommand for ListRoutesArgs {
    async fn run(&self, app: &App) -> AppResult<()> {
        info!("Routes:\n{}", format_routes(app.routes()));
        Ok(())
    }
}

fn format_routes(routes: &RouteRegistry) -> String {
    let width = routes
        .iter()
        .map(|route| route.endpoint.len())
        .max()
        .unwrap_or_default();
    routes
        .iter()
        .map(|route| format!("{:<width$}  {}", route.endpoint, route.path))
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http::pages;
    use insta::assert_snapshot;

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn format_pages_routes() {
        let mut routes = RouteRegistry::default();
        routes.register(&pages::blueprint()).unwrap();

        assert_snapshot!(format_routes(&routes));
    }
}
