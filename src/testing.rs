//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use bson::Document;
use mongodb::options::CreateIndexOptions;
use std::sync::Mutex;

use crate::error::Error;
use crate::index::structs::IndexCreateRequest;
use crate::store::{IndexDestination, IndexSource};

fn store_failure(message: &str) -> Error {
    let io = std::io::Error::new(std::io::ErrorKind::Other, message.to_string());
    Error::StoreAccess(mongodb::error::Error::from(io))
}

pub struct FakeSource {
    descriptors: Vec<Document>,
    fail: bool,
}

impl FakeSource {
    pub fn with(descriptors: Vec<Document>) -> Self {
        Self {
            descriptors,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            descriptors: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl IndexSource for FakeSource {
    async fn list_indexes(&self) -> Result<Vec<Document>, Error> {
        if self.fail {
            return Err(store_failure("listIndexes failed"));
        }
        Ok(self.descriptors.clone())
    }
}

#[derive(Default)]
pub struct FakeDestination {
    calls: Mutex<Vec<(Vec<IndexCreateRequest>, Option<CreateIndexOptions>)>>,
    fail: bool,
}

impl FakeDestination {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(Vec<IndexCreateRequest>, Option<CreateIndexOptions>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexDestination for FakeDestination {
    async fn create_indexes(
        &self,
        requests: Vec<IndexCreateRequest>,
        options: Option<CreateIndexOptions>,
    ) -> Result<Vec<String>, Error> {
        let names = requests
            .iter()
            .filter_map(|request| request.name().map(str::to_string))
            .collect();
        self.calls.lock().unwrap().push((requests, options));

        if self.fail {
            return Err(store_failure("createIndexes failed"));
        }
        Ok(names)
    }
}
