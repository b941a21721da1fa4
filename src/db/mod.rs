//! MongoDB connection handling.
//!
//! A [`Db`] is a handle to a single database connection. It is owned by the
//! [`AppContext`][crate::app::context::AppContext]; there is no process-wide connection.

pub mod seeder;

use crate::config::database::Database as DatabaseConfig;
use crate::error::AppResult;
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::fmt::{Debug, Formatter};
use tracing::{debug, instrument};
use uuid::Uuid;

/// The database used when the connection string does not name one.
pub const DEFAULT_DATABASE_NAME: &str = "test";

/// A connection to the MongoDB database named by a connection string.
///
/// Cloning a [`Db`] is cheap and the clone refers to the same connection (it has the same
/// [`Db::id`]). Use [`Db::connect`] to open a new, independent connection.
#[derive(Clone)]
pub struct Db {
    id: Uuid,
    client: Client,
    database: Database,
}

impl Db {
    /// Open a connection using the given config. The driver connects lazily, so an unreachable
    /// server is reported by the first operation rather than here; a malformed connection
    /// string is reported here.
    #[instrument(skip_all)]
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.server_selection_timeout);
        Self::from_options(options)
    }

    /// Open a connection using only a connection string, with the driver's default options.
    pub async fn connect_uri(uri: &str) -> AppResult<Self> {
        let options = ClientOptions::parse(uri).await?;
        Self::from_options(options)
    }

    fn from_options(options: ClientOptions) -> AppResult<Self> {
        let database_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_owned());
        let client = Client::with_options(options)?;
        let database = client.database(&database_name);
        let id = Uuid::new_v4();
        debug!(%id, database=%database_name, "Created DB connection");
        Ok(Self {
            id,
            client,
            database,
        })
    }

    /// Identifies this connection. Two handles with the same id share a connection.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The database named by the connection string (or [`DEFAULT_DATABASE_NAME`]).
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn name(&self) -> &str {
        self.database.name()
    }

    /// Round-trip a `ping` command to the server.
    #[instrument(skip_all)]
    pub async fn ping(&self) -> AppResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Drop the database with the given name. This is not necessarily the database this
    /// connection was opened against.
    #[instrument(skip(self))]
    pub async fn drop_database(&self, name: &str) -> AppResult<()> {
        self.client.database(name).drop().await?;
        Ok(())
    }

    /// Names of the collections in [`Db::database`], sorted alphabetically.
    pub async fn collection_names(&self) -> AppResult<Vec<String>> {
        let mut names = self.database.list_collection_names().await?;
        names.sort();
        Ok(names)
    }

    pub async fn estimated_count(&self, collection: &str) -> AppResult<u64> {
        let count = self
            .database
            .collection::<Document>(collection)
            .estimated_document_count()
            .await?;
        Ok(count)
    }
}

impl Debug for Db {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("id", &self.id)
            .field("database", &self.database.name())
            .finish()
    }
}
