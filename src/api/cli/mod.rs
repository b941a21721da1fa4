//! The `mongo-pages` command line interface. If no subcommand is given, the app is served.

use crate::api::cli::health::HealthArgs;
use crate::api::cli::list_routes::ListRoutesArgs;
use crate::api::cli::print_config::PrintConfigArgs;
use crate::api::cli::seed::SeedArgs;
use crate::api::cli::serve::ServeArgs;
use crate::app::{App, AppOptions};
use crate::config::environment::Environment;
use crate::error::AppResult;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_derive::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

pub mod health;
pub mod list_routes;
pub mod print_config;
pub mod seed;
pub mod serve;

/// Implemented by each command to run it against the built [`App`].
#[async_trait]
pub trait RunCommand {
    async fn run(&self, app: &App) -> AppResult<()>;
}

/// Serve pages backed by MongoDB, and manage the database.
#[derive(Debug, Parser, Serialize)]
#[command(version, about)]
#[non_exhaustive]
pub struct Cli {
    /// Specify the environment to use to run the application. If not provided, `production` is
    /// used if the `RUNNING_IN_PRODUCTION` env var is set, otherwise `development`.
    #[clap(short, long)]
    pub environment: Option<Environment>,

    /// The location of the config directory (where the app's config files are located). If
    /// not provided, will default to `./config/`.
    #[clap(long, value_name = "CONFIG_DIRECTORY", value_hint = clap::ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The environment to run in: the `--environment` arg if provided, otherwise the one
    /// selected by the process's env vars.
    pub fn environment(&self) -> Environment {
        self.environment.unwrap_or_else(Environment::from_env)
    }

    pub fn app_options(&self) -> AppOptions {
        AppOptions::builder()
            .environment(self.environment())
            .maybe_config_dir(self.config_dir.clone())
            .init_tracing(true)
            .build()
    }
}

#[derive(Debug, Subcommand, Serialize)]
#[serde(tag = "type")]
#[non_exhaustive]
pub enum Command {
    /// Serve the app until a shutdown signal is received. This is the default command.
    Serve(ServeArgs),

    /// Load the seed file into the database.
    Seed(SeedArgs),

    /// Print the app config.
    PrintConfig(PrintConfigArgs),

    /// List the app's named routes.
    ListRoutes(ListRoutesArgs),

    /// Check the health of the app's database connection.
    Health(HealthArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve(ServeArgs::default())
    }
}

#[async_trait]
impl RunCommand for Command {
    async fn run(&self, app: &App) -> AppResult<()> {
        match self {
            Command::Serve(args) => args.run(app).await,
            Command::Seed(args) => args.run(app).await,
            Command::PrintConfig(args) => args.run(app).await,
            Command::ListRoutes(args) => args.run(app).await,
            Command::Health(args) => args.run(app).await,
        }
    }
}

/// Parse the process's args and run the selected command.
pub async fn run() -> AppResult<()> {
    run_cli(Cli::parse()).await
}

/// Parse the given args and run the selected command.
pub async fn run_with_args<I, T>(args: I) -> AppResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    run_cli(Cli::try_parse_from(args)?).await
}

async fn run_cli(cli: Cli) -> AppResult<()> {
    let app = App::new(cli.app_options()).await?;

    let result = match cli.command.as_ref() {
        Some(command) => command.run(&app).await,
        None => Command::default().run(&app).await,
    };

    app.shutdown();

    result
}
