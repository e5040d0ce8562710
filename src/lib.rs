//! Copy MongoDB index definitions from one collection to another.
//!
//! Indexes are read from the source as raw `listIndexes` descriptors, rebuilt
//! into typed creation requests (options and collation included) and created
//! on the destination in a single `createIndexes` batch.

pub mod copy;
pub mod db;
pub mod error;
pub mod index;
pub mod store;

#[cfg(test)]
mod testing;

use mongodb::options::CreateIndexOptions;

pub use crate::copy::IndexCopy;
pub use crate::db::{MongoCollection, Namespace, DB};
pub use crate::error::{Error, IndexCopyError};
pub use crate::index::reconstruct::{reconstruct, Reconstructor, UnknownFieldPolicy};
pub use crate::index::structs::{CollationOptions, IndexCreateRequest, ReconstructedOptions};
pub use crate::store::{IndexDestination, IndexSource};

/// Copy all indexes of `source` to `destination`.
pub async fn copy_all_indexes<S, D>(
    source: &S,
    destination: &D,
    options: impl Into<Option<CreateIndexOptions>>,
) -> Result<Vec<String>, IndexCopyError>
where
    S: IndexSource + ?Sized,
    D: IndexDestination + ?Sized,
{
    IndexCopy::new().copy_all(source, destination, options).await
}

/// Copy the indexes named in `names` from `source` to `destination`.
pub async fn copy_indexes<I, S, D>(
    names: I,
    source: &S,
    destination: &D,
    options: impl Into<Option<CreateIndexOptions>>,
) -> Result<Vec<String>, IndexCopyError>
where
    I: IntoIterator,
    I::Item: Into<String>,
    S: IndexSource + ?Sized,
    D: IndexDestination + ?Sized,
{
    IndexCopy::new()
        .copy_named(names, source, destination, options)
        .await
}
