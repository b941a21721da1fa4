//! Session test fixture: build the app against a freshly seeded test database and drop the
//! database when the test completes.
//!
//! The test database is read from the following env vars: `MONGODB_USERNAME`,
//! `MONGODB_PASSWORD`, `MONGODB_HOST` and `MONGODB_DATABASE`. All of them are required, unless
//! the `test-containers` feature is enabled, in which case a MongoDB container is started for
//! each test if any of them is unset.
//!
//! Tests using the fixture run one at a time. Each holds the test database exclusively from
//! setup until its teardown completes.

use crate::app::{App, AppOptions};
use crate::config::ConfigOverrides;
use crate::config::environment::Environment;
use crate::db::DEFAULT_DATABASE_NAME;
use crate::db::seeder::seed_data;
use crate::error::other::OtherError;
use crate::error::{AppResult, Error};
use futures::FutureExt;
use std::convert::Infallible;
use std::env;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
#[cfg(feature = "test-containers")]
use testcontainers_modules::mongo::Mongo;
#[cfg(feature = "test-containers")]
use testcontainers_modules::testcontainers::ContainerAsync;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const MONGODB_USERNAME_ENV_VAR: &str = "MONGODB_USERNAME";
pub const MONGODB_PASSWORD_ENV_VAR: &str = "MONGODB_PASSWORD";
pub const MONGODB_HOST_ENV_VAR: &str = "MONGODB_HOST";
pub const MONGODB_DATABASE_ENV_VAR: &str = "MONGODB_DATABASE";

/// The database dropped when a test completes. This is the server's default database, which is
/// not necessarily the one named by `MONGODB_DATABASE`.
pub const TEARDOWN_DATABASE: &str = DEFAULT_DATABASE_NAME;

static SESSION_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// The seed file loaded before each test.
pub fn seed_file() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("seed_data.json")
}

/// Credentials and location of the MongoDB database used by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct TestDatabase {
    pub username: String,
    pub password: String,
    pub host: String,
    pub database: String,
}

impl TestDatabase {
    /// Read the test database from the process's env vars. Fails if any of them is unset.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the test database using the given env var lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let var = |name: &str| {
            lookup(name).ok_or_else(|| Error::from(OtherError::MissingEnvVar(name.to_owned())))
        };
        Ok(Self {
            username: var(MONGODB_USERNAME_ENV_VAR)?,
            password: var(MONGODB_PASSWORD_ENV_VAR)?,
            host: var(MONGODB_HOST_ENV_VAR)?,
            database: var(MONGODB_DATABASE_ENV_VAR)?,
        })
    }

    /// The connection string for the test database, authenticating against the `admin`
    /// database.
    pub fn uri(&self) -> String {
        format!(
            "mongodb://{}:{}@{}/{}?authSource=admin",
            self.username, self.password, self.host, self.database
        )
    }

    /// The config overrides used to build the test app.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides::default()
            .set("database.uri", self.uri())
            .set("app.testing", true)
    }
}

#[cfg(feature = "test-containers")]
const TEST_CONTAINER_USERNAME: &str = "mongo";
#[cfg(feature = "test-containers")]
const TEST_CONTAINER_PASSWORD: &str = "mongo";
#[cfg(feature = "test-containers")]
const TEST_CONTAINER_DATABASE: &str = "testdb";
#[cfg(feature = "test-containers")]
const MONGO_PORT: u16 = 27017;

/// Start a MongoDB container with a root user and describe it as a [`TestDatabase`]. The
/// container is removed when the returned handle is dropped.
#[cfg(feature = "test-containers")]
pub async fn mongo_test_container() -> AppResult<(TestDatabase, ContainerAsync<Mongo>)> {
    use testcontainers_modules::testcontainers::ImageExt;
    use testcontainers_modules::testcontainers::runners::AsyncRunner;

    let container = Mongo::default()
        .with_env_var("MONGO_INITDB_ROOT_USERNAME", TEST_CONTAINER_USERNAME)
        .with_env_var("MONGO_INITDB_ROOT_PASSWORD", TEST_CONTAINER_PASSWORD)
        .start()
        .await?;
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(MONGO_PORT).await?;
    info!(%host, port, "Started MongoDB test container");

    let database = TestDatabase {
        username: TEST_CONTAINER_USERNAME.to_owned(),
        password: TEST_CONTAINER_PASSWORD.to_owned(),
        host: format!("{host}:{port}"),
        database: TEST_CONTAINER_DATABASE.to_owned(),
    };
    Ok((database, container))
}

/// The test app for the duration of one test, along with anything that needs to outlive it.
struct Session {
    app: App,
    #[cfg(feature = "test-containers")]
    _container: Option<ContainerAsync<Mongo>>,
}

impl Session {
    async fn start() -> AppResult<Self> {
        #[cfg(not(feature = "test-containers"))]
        let database = TestDatabase::from_env()?;

        #[cfg(feature = "test-containers")]
        let (database, container) = match TestDatabase::from_env() {
            Ok(database) => (database, None),
            Err(_) => {
                let (database, container) = mongo_test_container().await?;
                (database, Some(container))
            }
        };

        let app = setup(&database).await?;
        Ok(Self {
            app,
            #[cfg(feature = "test-containers")]
            _container: container,
        })
    }
}

/// Build the test app and seed its database. The app's connection is re-established against the
/// test database before seeding.
pub async fn setup(database: &TestDatabase) -> AppResult<App> {
    let app = App::new(
        AppOptions::builder()
            .environment(Environment::Development)
            .overrides(database.overrides())
            .build(),
    )
    .await?;

    let db = app.context().reconnect().await?;
    let report = seed_data(&db, &seed_file(), true).await?;
    info!(database=%db.name(), documents=report.total(), "Seeded test database");

    Ok(app)
}

/// Drop the [`TEARDOWN_DATABASE`].
pub async fn teardown(app: &App) -> AppResult<()> {
    info!(database = TEARDOWN_DATABASE, "Dropping test database");
    app.context().db().drop_database(TEARDOWN_DATABASE).await
}

/// Run a test against the seeded test app. The teardown runs even if the test panics; the panic
/// is resumed after the teardown completes. Waits for any other test using the fixture to
/// finish first.
pub async fn run_test(test_fn: impl AsyncFnOnce(&App)) -> AppResult<()> {
    let result = run_test_with_result(async move |app| -> Result<(), Infallible> {
        test_fn(app).await;
        Ok(())
    })
    .await;

    if let Err((Some(err), _)) = result {
        return Err(err);
    }

    Ok(())
}

/// Similar to [`run_test`], except allows returning a [`Result`] to communicate test
/// success/failure. If the test returns an [`Err`], the teardown still runs, and the error is
/// returned in the [`Err`] returned by [`run_test_with_result`] itself along with any setup or
/// teardown error.
pub async fn run_test_with_result<T, E>(test_fn: T) -> Result<(), (Option<Error>, Option<E>)>
where
    T: AsyncFnOnce(&App) -> Result<(), E>,
    E: std::error::Error,
{
    let _session_guard = SESSION_LOCK.lock().await;

    let session = match Session::start().await {
        Ok(session) => session,
        Err(err) => return Err((Some(err), None)),
    };
    let app = &session.app;

    debug!("Starting test");
    let test_result = AssertUnwindSafe(test_fn(app)).catch_unwind().await;
    debug!("Test complete");

    let teardown_result = teardown(app).await;
    app.shutdown();
    drop(session);

    let test_result = match test_result {
        Ok(result) => result.err(),
        Err(panic) => resume_unwind(panic),
    };
    let teardown_result = teardown_result.err();

    if teardown_result.is_some() || test_result.is_some() {
        return Err((teardown_result, test_result));
    }

    Ok(())
}
