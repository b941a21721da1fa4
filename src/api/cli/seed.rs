use crate::api::cli::RunCommand;
use crate::app::App;
use crate::db::seeder::seed_data;
use crate::error::AppResult;
use crate::error::cli::CliError;
use async_trait::async_trait;
use clap::Parser;
use serde_derive::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SEEDED_MESSAGE: &str = "Database seeded!";

#[derive(Debug, Default, Parser, Serialize)]
#[non_exhaustive]
pub struct SeedArgs {
    /// Drop each collection in the seed file before inserting its documents. Otherwise, the
    /// documents are appended to the existing collections.
    #[clap(long, action)]
    pub drop: bool,

    /// The seed file to load. Defaults to the `seed.filename` config (`seed_data.json`).
    #[clap(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub filename: Option<PathBuf>,
}

impl SeedArgs {
    fn filename<'a>(&'a self, app: &'a App) -> &'a Path {
        self.filename
            .as_deref()
            .unwrap_or(app.config().seed.filename.as_path())
    }
}

#[async_trait]
impl RunCommand for SeedArgs {
    // `println` is the command's output, not a log.
    #[allow(clippy::disallowed_macros)]
    async fn run(&self, app: &App) -> AppResult<()> {
        let path = self.filename(app);
        if !path.is_file() {
            return Err(CliError::SeedFileNotFound(path.to_path_buf()).into());
        }

        let report = seed_data(&app.context().db(), path, self.drop).await?;
        info!(
            collections = report.inserted.len(),
            documents = report.total(),
            "Seeded database"
        );

        println!("{SEEDED_MESSAGE}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use crate::config::ConfigOverrides;
    use crate::error::Error;

    async fn app() -> App {
        App::new(
            AppOptions::builder()
                .config_dir("does-not-exist/")
                .overrides(
                    ConfigOverrides::default()
                        .set("database.uri", "mongodb://localhost:27017/example"),
                )
                .build(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn filename_defaults_to_config() {
        let app = app().await;

        let args = SeedArgs::default();
        assert_eq!(args.filename(&app), Path::new("seed_data.json"));

        let args = SeedArgs {
            drop: false,
            filename: Some(PathBuf::from("other.json")),
        };
        assert_eq!(args.filename(&app), Path::new("other.json"));
    }

    #[tokio::test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    async fn missing_seed_file() {
        let app = app().await;
        let args = SeedArgs {
            drop: true,
            filename: Some(PathBuf::from("does-not-exist.json")),
        };

        let err = args.run(&app).await.unwrap_err();

        assert!(matches!(err, Error::Cli(CliError::SeedFileNotFound(_))));
    }
}
