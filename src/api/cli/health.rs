use crate::api::cli::RunCommand;
use crate::api::core::health::health_check;
use crate::app::App;
use crate::error::AppResult;
use async_trait::async_trait;
use clap::Parser;
use serde_derive::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser, Serialize)]
#[non_exhaustive]
pub struct HealthArgs {
    /// Maximum time to spend checking the health of the resources in milliseconds. Defaults to
    /// the `database.server-selection-timeout` config.
    #[clap(short = 'd', long)]
    max_duration: Option<u64>,
}

#[async_trait]
impl RunCommand for HealthArgs {
    async fn run(&self, app: &App) -> AppResult<()> {
        let duration = self
            .max_duration
            .map(Duration::from_millis)
            .unwrap_or(app.config().database.server_selection_timeout);
        let health = health_check(app.context(), Some(duration)).await?;
        let health = serde_json::to_string_pretty(&health)?;
        info!("\n{health}");
        Ok(())
    }
}
