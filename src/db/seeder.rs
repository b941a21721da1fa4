//! Load fixture documents from a JSON seed file into the database.
//!
//! A seed file is a JSON object mapping collection names to arrays of documents:
//!
//! ```json
//! {
//!     "destinations": [
//!         { "name": "Lisbon", "description": "..." }
//!     ],
//!     "cruises": []
//! }
//! ```

use crate::db::Db;
use crate::error::AppResult;
use crate::error::seed::SeedError;
use mongodb::bson::{Document, to_document};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, instrument};

/// A parsed seed file. Collections keep the order in which they appear in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedData {
    pub collections: Vec<SeedCollection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedCollection {
    pub name: String,
    pub documents: Vec<Document>,
}

/// How many documents were inserted into each collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: Vec<(String, usize)>,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.inserted.iter().map(|(_, count)| count).sum()
    }
}

impl SeedData {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(contents)?;
        let Value::Object(root) = value else {
            return Err(SeedError::RootNotObject.into());
        };

        let collections = root
            .into_iter()
            .map(|(name, documents)| parse_collection(name, documents))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { collections })
    }
}

fn parse_collection(name: String, documents: Value) -> AppResult<SeedCollection> {
    if name.trim().is_empty() {
        return Err(SeedError::EmptyCollectionName.into());
    }
    let Value::Array(documents) = documents else {
        return Err(SeedError::CollectionNotArray(name).into());
    };

    let documents = documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| match document {
            Value::Object(document) => to_bson_document(&document),
            _ => Err(SeedError::DocumentNotObject {
                collection: name.clone(),
                index,
            }
            .into()),
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(SeedCollection { name, documents })
}

fn to_bson_document(document: &Map<String, Value>) -> AppResult<Document> {
    Ok(to_document(document)?)
}

/// Seed the database from the given file. If `drop` is `true`, each collection named in the file
/// is dropped before its documents are inserted; otherwise the documents are appended to the
/// existing contents.
#[instrument(skip(db))]
pub async fn seed_data(db: &Db, path: &Path, drop: bool) -> AppResult<SeedReport> {
    let data = SeedData::from_file(path)?;
    seed(db, &data, drop).await
}

pub async fn seed(db: &Db, data: &SeedData, drop: bool) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();
    for collection in data.collections.iter() {
        let handle = db.database().collection::<Document>(&collection.name);
        if drop {
            info!(collection=%collection.name, "Dropping collection");
            handle.drop().await?;
        }
        if !collection.documents.is_empty() {
            handle.insert_many(&collection.documents).await?;
        }
        info!(collection=%collection.name, count=%collection.documents.len(), "Inserted documents");
        report
            .inserted
            .push((collection.name.clone(), collection.documents.len()));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use mongodb::bson::doc;
    use rstest::rstest;

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn parse_keeps_file_order() {
        let data = SeedData::from_json_str(
            r#"{
                "zebras": [ { "name": "Zed" } ],
                "antelopes": [ { "name": "Ann", "legs": 4 }, { "name": "Abe" } ],
                "empty": []
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = data
            .collections
            .iter()
            .map(|collection| collection.name.as_str())
            .collect();
        assert_eq!(names, ["zebras", "antelopes", "empty"]);
        assert_eq!(
            data.collections[1].documents,
            vec![doc! { "name": "Ann", "legs": 4_i64 }, doc! { "name": "Abe" }]
        );
        assert!(data.collections[2].documents.is_empty());
    }

    #[rstest]
    #[case::root_array("[]")]
    #[case::not_json("{")]
    #[case::collection_not_array(r#"{ "pages": { "title": "Home" } }"#)]
    #[case::document_not_object(r#"{ "pages": [ { "title": "Home" }, "About" ] }"#)]
    #[case::empty_collection_name(r#"{ "": [] }"#)]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn parse_invalid(#[case] contents: &str) {
        assert!(SeedData::from_json_str(contents).is_err());
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn document_not_object_reports_position() {
        let err = SeedData::from_json_str(r#"{ "pages": [ {}, {}, 3 ] }"#).unwrap_err();

        assert!(matches!(
            err,
            Error::Seed(SeedError::DocumentNotObject { ref collection, index: 2 }) if collection == "pages"
        ));
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn missing_file() {
        let err = SeedData::from_file(Path::new("does-not-exist.json")).unwrap_err();

        assert!(matches!(err, Error::Seed(SeedError::Read { .. })));
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn bundled_seed_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("seed_data.json");

        let data = SeedData::from_file(&path).unwrap();

        assert!(!data.collections.is_empty());
        assert!(
            data.collections
                .iter()
                .all(|collection| !collection.documents.is_empty())
        );
    }

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn report_total() {
        let report = SeedReport {
            inserted: vec![("a".to_owned(), 2), ("b".to_owned(), 3)],
        };

        assert_eq!(report.total(), 5);
    }
}
