//! Seeding tests against a real MongoDB database.
//!
//! These need either the `test-containers` feature (and a Docker daemon), or the
//! `MONGODB_USERNAME`, `MONGODB_PASSWORD`, `MONGODB_HOST` and `MONGODB_DATABASE` env vars. Without
//! the feature they are ignored by default; run them with `cargo test -- --ignored`.

use mongo_pages::db::seeder::{SeedData, seed_data};
use mongo_pages::testing::fixture::{TEARDOWN_DATABASE, run_test, seed_file, teardown};
use mongodb::bson::{Document, doc};
use std::time::Duration;

fn expected_counts() -> Vec<(String, u64)> {
    SeedData::from_file(&seed_file())
        .unwrap()
        .collections
        .into_iter()
        .map(|collection| (collection.name, collection.documents.len() as u64))
        .collect()
}

#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn session_database_is_seeded() {
    run_test(async |app| {
        let db = app.context().db();

        assert!(app.config().app.testing);
        assert!(app.config().database.uri.contains("authSource=admin"));
        for (collection, count) in expected_counts() {
            assert_eq!(db.estimated_count(&collection).await.unwrap(), count);
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn seed_without_drop_appends() {
    run_test(async |app| {
        let db = app.context().db();

        seed_data(&db, &seed_file(), false).await.unwrap();

        for (collection, count) in expected_counts() {
            assert_eq!(db.estimated_count(&collection).await.unwrap(), count * 2);
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn seed_with_drop_replaces() {
    run_test(async |app| {
        let db = app.context().db();
        seed_data(&db, &seed_file(), false).await.unwrap();

        seed_data(&db, &seed_file(), true).await.unwrap();

        for (collection, count) in expected_counts() {
            assert_eq!(db.estimated_count(&collection).await.unwrap(), count);
        }
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn concurrent_tests_do_not_share_data() {
    let appending = run_test(async |app| {
        seed_data(&app.context().db(), &seed_file(), false)
            .await
            .unwrap();
    });
    let reading = run_test(async |app| {
        let db = app.context().db();
        let before = expected_counts();
        tokio::time::sleep(Duration::from_millis(200)).await;
        for (collection, count) in before {
            assert_eq!(db.estimated_count(&collection).await.unwrap(), count);
        }
    });

    let (appending, reading) = tokio::join!(appending, reading);
    appending.unwrap();
    reading.unwrap();
}

#[cfg(feature = "cli")]
#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn seed_command() {
    use clap::Parser;
    use mongo_pages::api::cli::{Cli, RunCommand};

    run_test(async |app| {
        let filename = seed_file();
        let cli = Cli::try_parse_from([
            "mongo-pages".to_owned(),
            "seed".to_owned(),
            "--drop".to_owned(),
            format!("--filename={}", filename.display()),
        ])
        .unwrap();

        cli.command.unwrap().run(app).await.unwrap();

        let db = app.context().db();
        for (collection, count) in expected_counts() {
            assert_eq!(db.estimated_count(&collection).await.unwrap(), count);
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn teardown_drops_test_database() {
    run_test(async |app| {
        let client = app.context().db().client().clone();
        client
            .database(TEARDOWN_DATABASE)
            .collection::<Document>("marker")
            .insert_one(doc! { "marker": true })
            .await
            .unwrap();
        assert!(
            client
                .list_database_names()
                .await
                .unwrap()
                .iter()
                .any(|name| name == TEARDOWN_DATABASE)
        );

        teardown(app).await.unwrap();

        let names = client.list_database_names().await.unwrap();
        assert!(!names.iter().any(|name| name == TEARDOWN_DATABASE));
    })
    .await
    .unwrap();
}
