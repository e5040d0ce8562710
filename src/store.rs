use async_trait::async_trait;
use bson::Document;
use mongodb::options::CreateIndexOptions;

use crate::error::Error;
use crate::index::structs::IndexCreateRequest;

type Result<T> = std::result::Result<T, Error>;

/// A collection whose indexes can be listed as raw descriptor documents.
#[async_trait]
pub trait IndexSource: Send + Sync {
    async fn list_indexes(&self) -> Result<Vec<Document>>;
}

/// A collection that accepts a batch of index creations in one call.
#[async_trait]
pub trait IndexDestination: Send + Sync {
    /// Create every requested index and return the names the server reports.
    async fn create_indexes(
        &self,
        requests: Vec<IndexCreateRequest>,
        options: Option<CreateIndexOptions>,
    ) -> Result<Vec<String>>;
}
