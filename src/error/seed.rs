use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error("Unable to read seed file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The root of a seed file must be an object mapping collection names to documents")]
    RootNotObject,

    #[error("Collection names in a seed file must not be empty")]
    EmptyCollectionName,

    #[error("Seed data for collection `{0}` must be an array of documents")]
    CollectionNotArray(String),

    #[error("Document #{index} for collection `{collection}` must be an object")]
    DocumentNotObject { collection: String, index: usize },
}
