use bson::Document;
use mongodb::options::CreateIndexOptions;
use std::collections::BTreeSet;

use crate::error::{Error, IndexCopyError};
use crate::index::reader::{list_all, list_filtered};
use crate::index::reconstruct::{Reconstructor, UnknownFieldPolicy};
use crate::index::structs::IndexCreateRequest;
use crate::store::{IndexDestination, IndexSource};

type Result<T> = std::result::Result<T, Error>;

/// Copies index definitions from a source collection to a destination.
///
/// Each copy lists the source once, rebuilds a creation request per index
/// and submits all of them to the destination in a single batch. Every
/// failure along the way comes back as one [`IndexCopyError`].
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexCopy {
    reconstructor: Reconstructor,
}

impl IndexCopy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.reconstructor = Reconstructor::new(policy);
        self
    }

    /// Copy every index of `source`, returning the names created on `destination`.
    pub async fn copy_all<S, D>(
        &self,
        source: &S,
        destination: &D,
        options: impl Into<Option<CreateIndexOptions>>,
    ) -> std::result::Result<Vec<String>, IndexCopyError>
    where
        S: IndexSource + ?Sized,
        D: IndexDestination + ?Sized,
    {
        self.try_copy_all(source, destination, options.into())
            .await
            .map_err(wrap)
    }

    /// Copy only the named indexes; fails if any of them is absent from `source`.
    pub async fn copy_named<I, S, D>(
        &self,
        names: I,
        source: &S,
        destination: &D,
        options: impl Into<Option<CreateIndexOptions>>,
    ) -> std::result::Result<Vec<String>, IndexCopyError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        S: IndexSource + ?Sized,
        D: IndexDestination + ?Sized,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        self.try_copy_named(&names, source, destination, options.into())
            .await
            .map_err(wrap)
    }

    /// Build one creation request per descriptor.
    pub fn requests(&self, descriptors: &[Document]) -> Result<Vec<IndexCreateRequest>> {
        descriptors
            .iter()
            .map(|descriptor| -> Result<IndexCreateRequest> {
                Ok(IndexCreateRequest {
                    keys: descriptor.get_document("key")?.clone(),
                    options: self.reconstructor.reconstruct(descriptor)?,
                })
            })
            .collect()
    }

    async fn try_copy_all<S, D>(
        &self,
        source: &S,
        destination: &D,
        options: Option<CreateIndexOptions>,
    ) -> Result<Vec<String>>
    where
        S: IndexSource + ?Sized,
        D: IndexDestination + ?Sized,
    {
        let descriptors = list_all(source).await?;
        self.create(descriptors, destination, options).await
    }

    async fn try_copy_named<S, D>(
        &self,
        names: &BTreeSet<String>,
        source: &S,
        destination: &D,
        options: Option<CreateIndexOptions>,
    ) -> Result<Vec<String>>
    where
        S: IndexSource + ?Sized,
        D: IndexDestination + ?Sized,
    {
        let descriptors = list_filtered(source, names).await?;
        self.create(descriptors, destination, options).await
    }

    async fn create<D>(
        &self,
        descriptors: Vec<Document>,
        destination: &D,
        options: Option<CreateIndexOptions>,
    ) -> Result<Vec<String>>
    where
        D: IndexDestination + ?Sized,
    {
        let requests = self.requests(&descriptors)?;
        if requests.is_empty() {
            log::debug!("No indexes to copy");
            return Ok(Vec::new());
        }

        log::debug!("Creating {} indexes on destination", requests.len());
        let names = destination.create_indexes(requests, options).await?;
        log::info!("Copied indexes: {}", names.join(", "));
        Ok(names)
    }
}

fn wrap(cause: Error) -> IndexCopyError {
    log::error!("Index copy failed: {}", cause);
    IndexCopyError::from(cause)
}
