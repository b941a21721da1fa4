use crate::api::cli::RunCommand;
use crate::app::App;
use crate::error::AppResult;
use crate::service::runner;
use async_trait::async_trait;
use clap::Parser;
use serde_derive::Serialize;

#[derive(Debug, Default, Parser, Serialize)]
#[non_exhaustive]
pub struct ServeArgs {}

#[async_trait]
impl RunCommand for ServeArgs {
    async fn run(&self, app: &App) -> AppResult<()> {
        runner::run(app).await
    }
}
