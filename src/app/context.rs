use crate::config::AppConfig;
use crate::db::Db;
use crate::error::AppResult;
use std::sync::{Arc, RwLock};
use tracing::info;

/// State shared by the request handlers and CLI commands of an [`App`][crate::app::App].
///
/// The context owns the app's database connection. Cloning the context is cheap; all clones
/// share the same connection, and [`AppContext::reconnect`] replaces it for all of them.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<AppContextInner>,
}

struct AppContextInner {
    config: AppConfig,
    db: RwLock<Db>,
}

impl AppContext {
    pub(crate) fn new(config: AppConfig, db: Db) -> Self {
        Self {
            inner: Arc::new(AppContextInner {
                config,
                db: RwLock::new(db),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// The current database connection.
    pub fn db(&self) -> Db {
        match self.inner.db.read() {
            Ok(db) => db.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Open a new connection to the configured database and make it the context's connection.
    /// The previous connection is released once no in-flight request holds it.
    ///
    /// The context's config is never changed, so the new connection always uses the same
    /// `database.uri` that [`AppContext::config`] reports.
    pub async fn reconnect(&self) -> AppResult<Db> {
        let db = Db::connect(&self.inner.config.database).await?;
        info!(id=%db.id(), database=%db.name(), "Reconnected to database");

        let mut current = match self.inner.db.write() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = db.clone();
        Ok(db)
    }
}
