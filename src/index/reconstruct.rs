use bson::{Bson, Document};
use core::time::Duration;

use crate::error::Error;
use crate::index::structs::{
    Alternate, CaseFirst, CollationOptions, MaxVariable, ReconstructedOptions, Strength,
};

type Result<T> = std::result::Result<T, Error>;

/// Descriptor keys that map onto an index option.
pub const OPTION_FIELDS: &[&str] = &[
    "background",
    "unique",
    "name",
    "sparse",
    "expireAfterSeconds",
    "v",
    "weights",
    "default_language",
    "language_override",
    "textIndexVersion",
    "2dsphereIndexVersion",
    "bits",
    "min",
    "max",
    "bucketSize",
    "storageEngine",
    "partialFilterExpression",
    "collation",
    "wildcardProjection",
    "hidden",
];

/// Descriptor keys assigned by the server rather than by index creation.
pub const STORE_ASSIGNED_FIELDS: &[&str] = &["key", "ns"];

pub const COLLATION_FIELDS: &[&str] = &[
    "locale",
    "caseLevel",
    "caseFirst",
    "strength",
    "numericOrdering",
    "alternate",
    "maxVariable",
    "normalization",
    "backwards",
];

// ICU version the server stamps on every collation it reports.
const STORE_ASSIGNED_COLLATION_FIELDS: &[&str] = &["version"];

/// What to do with descriptor keys outside the recognized set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    #[default]
    Ignore,
    Reject,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Reconstructor {
    unknown_fields: UnknownFieldPolicy,
}

impl Reconstructor {
    pub fn new(unknown_fields: UnknownFieldPolicy) -> Self {
        Self { unknown_fields }
    }

    /// Rebuild creation options from one descriptor returned by `listIndexes`.
    pub fn reconstruct(&self, descriptor: &Document) -> Result<ReconstructedOptions> {
        self.check_unknown(descriptor, &[OPTION_FIELDS, STORE_ASSIGNED_FIELDS], "")?;

        Ok(ReconstructedOptions {
            background: optional(descriptor, "background", boolean)?,
            unique: optional(descriptor, "unique", boolean)?,
            name: optional(descriptor, "name", string)?,
            sparse: optional(descriptor, "sparse", boolean)?,
            expire_after: optional(descriptor, "expireAfterSeconds", seconds)?,
            version: optional(descriptor, "v", unsigned)?,
            weights: optional(descriptor, "weights", document)?,
            default_language: optional(descriptor, "default_language", string)?,
            language_override: optional(descriptor, "language_override", string)?,
            text_index_version: optional(descriptor, "textIndexVersion", unsigned)?,
            sphere_index_version: optional(descriptor, "2dsphereIndexVersion", unsigned)?,
            bits: optional(descriptor, "bits", unsigned)?,
            min: optional(descriptor, "min", double)?,
            max: optional(descriptor, "max", double)?,
            bucket_size: optional(descriptor, "bucketSize", double)?,
            storage_engine: optional(descriptor, "storageEngine", document)?,
            partial_filter_expression: optional(descriptor, "partialFilterExpression", document)?,
            collation: optional(descriptor, "collation", |field, value| {
                self.reconstruct_collation(&document(field, value)?)
            })?,
            wildcard_projection: optional(descriptor, "wildcardProjection", document)?,
            hidden: optional(descriptor, "hidden", boolean)?,
        })
    }

    /// Rebuild collation rules from the `collation` sub-document of a descriptor.
    pub fn reconstruct_collation(&self, collation: &Document) -> Result<CollationOptions> {
        self.check_unknown(
            collation,
            &[COLLATION_FIELDS, STORE_ASSIGNED_COLLATION_FIELDS],
            "collation.",
        )?;

        let locale = optional(collation, "locale", string)?
            .ok_or_else(|| Error::invalid("collation.locale", "collation has no locale"))?;

        Ok(CollationOptions {
            locale,
            case_level: optional(collation, "caseLevel", boolean)?,
            case_first: optional(collation, "caseFirst", |field, value| {
                string(field, value)?.parse::<CaseFirst>()
            })?,
            strength: optional(collation, "strength", |field, value| {
                Strength::try_from(integer(field, value)?)
            })?,
            numeric_ordering: optional(collation, "numericOrdering", boolean)?,
            alternate: optional(collation, "alternate", |field, value| {
                string(field, value)?.parse::<Alternate>()
            })?,
            max_variable: optional(collation, "maxVariable", |field, value| {
                string(field, value)?.parse::<MaxVariable>()
            })?,
            normalization: optional(collation, "normalization", boolean)?,
            backwards: optional(collation, "backwards", boolean)?,
        })
    }

    fn check_unknown(&self, doc: &Document, known: &[&[&str]], prefix: &str) -> Result<()> {
        let unknown = doc
            .keys()
            .find(|key| !known.iter().any(|set| set.contains(&key.as_str())));

        match (self.unknown_fields, unknown) {
            (UnknownFieldPolicy::Reject, Some(key)) => {
                Err(Error::UnrecognizedField(format!("{}{}", prefix, key)))
            }
            (UnknownFieldPolicy::Ignore, Some(key)) => {
                log::debug!("Ignoring unrecognized index field {}{}", prefix, key);
                Ok(())
            }
            (_, None) => Ok(()),
        }
    }
}

/// Reconstruct options with the default (ignore unknown fields) policy.
pub fn reconstruct(descriptor: &Document) -> Result<ReconstructedOptions> {
    Reconstructor::default().reconstruct(descriptor)
}

fn optional<T, F>(doc: &Document, field: &str, extract: F) -> Result<Option<T>>
where
    F: FnOnce(&str, &Bson) -> Result<T>,
{
    doc.get(field).map(|value| extract(field, value)).transpose()
}

fn mismatch(field: &str, expected: &str, value: &Bson) -> Error {
    Error::invalid(
        field,
        format!("expected {}, found {:?}", expected, value.element_type()),
    )
}

fn boolean(field: &str, value: &Bson) -> Result<bool> {
    match value {
        Bson::Boolean(b) => Ok(*b),
        other => Err(mismatch(field, "boolean", other)),
    }
}

fn string(field: &str, value: &Bson) -> Result<String> {
    match value {
        Bson::String(s) => Ok(s.clone()),
        other => Err(mismatch(field, "string", other)),
    }
}

fn document(field: &str, value: &Bson) -> Result<Document> {
    match value {
        Bson::Document(d) => Ok(d.clone()),
        other => Err(mismatch(field, "document", other)),
    }
}

// Servers report small integers as Int32, but older tooling may have stored
// Int64 or integral doubles; accept any of them when no precision is lost.
fn integer(field: &str, value: &Bson) -> Result<i64> {
    match value {
        Bson::Int32(i) => Ok(i64::from(*i)),
        Bson::Int64(i) => Ok(*i),
        Bson::Double(d) if d.fract() == 0.0 && d.abs() < i64::MAX as f64 => Ok(*d as i64),
        other => Err(mismatch(field, "integer", other)),
    }
}

fn unsigned(field: &str, value: &Bson) -> Result<u32> {
    let n = integer(field, value)?;
    u32::try_from(n).map_err(|_| Error::invalid(field, format!("{} is out of range", n)))
}

fn seconds(field: &str, value: &Bson) -> Result<Duration> {
    let n = integer(field, value)?;
    u64::try_from(n)
        .map(Duration::from_secs)
        .map_err(|_| Error::invalid(field, format!("{} is not a positive number of seconds", n)))
}

fn double(field: &str, value: &Bson) -> Result<f64> {
    match value {
        Bson::Double(d) => Ok(*d),
        Bson::Int32(i) => Ok(f64::from(*i)),
        Bson::Int64(i) => Ok(*i as f64),
        other => Err(mismatch(field, "double", other)),
    }
}
