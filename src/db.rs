use async_trait::async_trait;
use bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, CreateIndexOptions};
use mongodb::{Client, Collection, Database};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::index::structs::IndexCreateRequest;
use crate::store::{IndexDestination, IndexSource};

type Result<T> = std::result::Result<T, Error>;

const NAMESPACE_NOT_FOUND: i32 = 26;

#[derive(Clone, Debug)]
pub struct DB {
    pub client: Client,
}

impl DB {
    pub async fn init(url: &str) -> Result<Self> {
        let mut client_options = ClientOptions::parse(url).await?;
        client_options.app_name = Some("mongodb-index-copy".to_string());

        Ok(Self {
            client: Client::with_options(client_options)?,
        })
    }

    pub fn collection(&self, namespace: &Namespace) -> MongoCollection {
        MongoCollection::new(self.client.database(&namespace.db), &namespace.coll)
    }
}

/// `database.collection` pair, as given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub db: String,
    pub coll: String,
}

impl FromStr for Namespace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((db, coll)) if !db.is_empty() && !coll.is_empty() => Ok(Namespace {
                db: db.to_string(),
                coll: coll.to_string(),
            }),
            _ => Err(format!("'{}' is not of the form <database>.<collection>", s)),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.coll)
    }
}

/// Index access to one collection through the driver.
#[derive(Clone, Debug)]
pub struct MongoCollection {
    database: Database,
    collection: Collection<Document>,
}

impl MongoCollection {
    pub fn new(database: Database, collection: &str) -> Self {
        Self {
            collection: database.collection::<Document>(collection),
            database,
        }
    }
}

fn is_namespace_not_found(err: &mongodb::error::Error) -> bool {
    matches!(*err.kind, ErrorKind::Command(ref command_error) if command_error.code == NAMESPACE_NOT_FOUND)
}

fn batch(cursor: &Document, key: &str) -> Result<Vec<Document>> {
    Ok(cursor
        .get_array(key)?
        .iter()
        .filter_map(Bson::as_document)
        .cloned()
        .collect())
}

// Built by hand rather than through `Collection::create_indexes`, whose typed
// options cannot carry every value a descriptor may hold (e.g. a fractional
// `bucketSize`).
fn create_indexes_command(
    collection: &str,
    requests: &[IndexCreateRequest],
    options: Option<&CreateIndexOptions>,
) -> Result<Document> {
    let specs: Vec<Document> = requests
        .iter()
        .map(IndexCreateRequest::to_document)
        .collect();
    let mut command = doc! { "createIndexes": collection, "indexes": specs };

    if let Some(options) = options {
        if let Some(max_time) = options.max_time {
            command.insert("maxTimeMS", max_time.as_millis() as i64);
        }
        if let Some(ref quorum) = options.commit_quorum {
            command.insert("commitQuorum", bson::to_bson(quorum)?);
        }
        if let Some(ref write_concern) = options.write_concern {
            command.insert("writeConcern", bson::to_document(write_concern)?);
        }
    }
    Ok(command)
}

#[async_trait]
impl IndexSource for MongoCollection {
    // listIndexes is issued as a raw command so descriptors keep every field
    // the server reports, including ones the driver's IndexModel drops.
    async fn list_indexes(&self) -> Result<Vec<Document>> {
        let name = self.collection.name();
        log::debug!("Listing indexes in {}", self.collection.namespace());

        let command = doc! { "listIndexes": name };
        let response = match self.database.run_command(command, None).await {
            Ok(response) => response,
            Err(e) if is_namespace_not_found(&e) => {
                log::debug!("{} does not exist, no indexes", self.collection.namespace());
                return Ok(Vec::new());
            }
            Err(e) => {
                log::error!("Got error {}", e);
                return Err(e)?;
            }
        };

        let cursor = response.get_document("cursor")?;
        let mut indexes = batch(cursor, "firstBatch")?;
        let mut cursor_id = cursor.get_i64("id")?;

        while cursor_id != 0 {
            let command = doc! { "getMore": cursor_id, "collection": name };
            let response = self.database.run_command(command, None).await?;
            let cursor = response.get_document("cursor")?;
            indexes.extend(batch(cursor, "nextBatch")?);
            cursor_id = cursor.get_i64("id")?;
        }

        log::debug!(
            "Successfully got {} indexes in {}",
            indexes.len(),
            self.collection.namespace()
        );
        Ok(indexes)
    }
}

#[async_trait]
impl IndexDestination for MongoCollection {
    async fn create_indexes(
        &self,
        requests: Vec<IndexCreateRequest>,
        options: Option<CreateIndexOptions>,
    ) -> Result<Vec<String>> {
        log::debug!(
            "Creating {} indexes in {}",
            requests.len(),
            self.collection.namespace()
        );

        let names: Vec<String> = requests
            .iter()
            .filter_map(|request| request.name().map(str::to_string))
            .collect();
        let command =
            create_indexes_command(self.collection.name(), &requests, options.as_ref())?;

        let response = match self.database.run_command(command, None).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Got error {}", e);
                return Err(e)?;
            }
        };
        if let Ok(write_concern_error) = response.get_document("writeConcernError") {
            log::error!("Got write concern error {}", write_concern_error);
            return Err(Error::WriteConcern(write_concern_error.clone()));
        }

        log::debug!("Successfully created indexes in {}", self.collection.namespace());
        Ok(names)
    }
}
