use bson::{doc, Bson, Document};
use core::time::Duration;
use std::str::FromStr;

use crate::error::Error;

/// Index creation options rebuilt from a listed index descriptor.
///
/// A field is `Some` only when the descriptor carried the matching key, so
/// anything left `None` falls back to the destination server's default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconstructedOptions {
    pub background: Option<bool>,
    pub unique: Option<bool>,
    pub name: Option<String>,
    pub sparse: Option<bool>,
    pub expire_after: Option<Duration>,
    pub version: Option<u32>,
    pub weights: Option<Document>,
    pub default_language: Option<String>,
    pub language_override: Option<String>,
    pub text_index_version: Option<u32>,
    pub sphere_index_version: Option<u32>,
    pub bits: Option<u32>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub bucket_size: Option<f64>,
    pub storage_engine: Option<Document>,
    pub partial_filter_expression: Option<Document>,
    pub collation: Option<CollationOptions>,
    pub wildcard_projection: Option<Document>,
    pub hidden: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollationOptions {
    pub locale: String,
    pub case_level: Option<bool>,
    pub case_first: Option<CaseFirst>,
    pub strength: Option<Strength>,
    pub numeric_ordering: Option<bool>,
    pub alternate: Option<Alternate>,
    pub max_variable: Option<MaxVariable>,
    pub normalization: Option<bool>,
    pub backwards: Option<bool>,
}

/// Key specification plus options, ready for the destination.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexCreateRequest {
    pub keys: Document,
    pub options: ReconstructedOptions,
}

impl IndexCreateRequest {
    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    /// Index specification as sent in the `indexes` array of `createIndexes`.
    ///
    /// Keys are the ones `listIndexes` reports, so a spec built from a
    /// reconstructed descriptor lists back as the same descriptor.
    pub fn to_document(&self) -> Document {
        let mut spec = doc! { "key": self.keys.clone() };
        self.options.write_to(&mut spec);
        spec
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseFirst {
    Upper,
    Lower,
    Off,
}

impl FromStr for CaseFirst {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" => Ok(CaseFirst::Upper),
            "lower" => Ok(CaseFirst::Lower),
            "off" => Ok(CaseFirst::Off),
            other => Err(Error::invalid(
                "collation.caseFirst",
                format!("'{}' is not one of upper, lower, off", other),
            )),
        }
    }
}

/// ICU comparison level, sent over the wire as 1 through 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strength {
    Primary,
    Secondary,
    Tertiary,
    Quaternary,
    Identical,
}

impl TryFrom<i64> for Strength {
    type Error = Error;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Strength::Primary),
            2 => Ok(Strength::Secondary),
            3 => Ok(Strength::Tertiary),
            4 => Ok(Strength::Quaternary),
            5 => Ok(Strength::Identical),
            other => Err(Error::invalid(
                "collation.strength",
                format!("{} is not a level between 1 and 5", other),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alternate {
    NonIgnorable,
    Shifted,
}

impl FromStr for Alternate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "non-ignorable" => Ok(Alternate::NonIgnorable),
            "shifted" => Ok(Alternate::Shifted),
            other => Err(Error::invalid(
                "collation.alternate",
                format!("'{}' is not one of non-ignorable, shifted", other),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxVariable {
    Punct,
    Space,
}

impl FromStr for MaxVariable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "punct" => Ok(MaxVariable::Punct),
            "space" => Ok(MaxVariable::Space),
            other => Err(Error::invalid(
                "collation.maxVariable",
                format!("'{}' is not one of punct, space", other),
            )),
        }
    }
}

impl CaseFirst {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseFirst::Upper => "upper",
            CaseFirst::Lower => "lower",
            CaseFirst::Off => "off",
        }
    }
}

impl Strength {
    pub fn level(&self) -> i32 {
        match self {
            Strength::Primary => 1,
            Strength::Secondary => 2,
            Strength::Tertiary => 3,
            Strength::Quaternary => 4,
            Strength::Identical => 5,
        }
    }
}

impl Alternate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alternate::NonIgnorable => "non-ignorable",
            Alternate::Shifted => "shifted",
        }
    }
}

impl MaxVariable {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaxVariable::Punct => "punct",
            MaxVariable::Space => "space",
        }
    }
}

fn put<T: Into<Bson>>(doc: &mut Document, key: &str, value: Option<T>) {
    if let Some(value) = value {
        doc.insert(key, value);
    }
}

// Small integers go out as Int32, the width the server itself reports them in.
fn int(n: u64) -> Bson {
    match i32::try_from(n) {
        Ok(i) => Bson::Int32(i),
        Err(_) => Bson::Int64(n as i64),
    }
}

impl ReconstructedOptions {
    fn write_to(&self, spec: &mut Document) {
        put(spec, "background", self.background);
        put(spec, "unique", self.unique);
        put(spec, "name", self.name.clone());
        put(spec, "sparse", self.sparse);
        put(spec, "expireAfterSeconds", self.expire_after.map(|d| int(d.as_secs())));
        put(spec, "v", self.version.map(|v| int(v.into())));
        put(spec, "weights", self.weights.clone());
        put(spec, "default_language", self.default_language.clone());
        put(spec, "language_override", self.language_override.clone());
        put(spec, "textIndexVersion", self.text_index_version.map(|v| int(v.into())));
        put(spec, "2dsphereIndexVersion", self.sphere_index_version.map(|v| int(v.into())));
        put(spec, "bits", self.bits.map(|v| int(v.into())));
        put(spec, "min", self.min);
        put(spec, "max", self.max);
        put(spec, "bucketSize", self.bucket_size);
        put(spec, "storageEngine", self.storage_engine.clone());
        put(spec, "partialFilterExpression", self.partial_filter_expression.clone());
        put(spec, "collation", self.collation.as_ref().map(CollationOptions::to_document));
        put(spec, "wildcardProjection", self.wildcard_projection.clone());
        put(spec, "hidden", self.hidden);
    }
}

impl CollationOptions {
    pub fn to_document(&self) -> Document {
        let mut collation = doc! { "locale": self.locale.clone() };
        put(&mut collation, "caseLevel", self.case_level);
        put(&mut collation, "caseFirst", self.case_first.map(|c| c.as_str()));
        put(&mut collation, "strength", self.strength.map(|s| s.level()));
        put(&mut collation, "numericOrdering", self.numeric_ordering);
        put(&mut collation, "alternate", self.alternate.map(|a| a.as_str()));
        put(&mut collation, "maxVariable", self.max_variable.map(|m| m.as_str()));
        put(&mut collation, "normalization", self.normalization);
        put(&mut collation, "backwards", self.backwards);
        collation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn enum_values_parse_from_wire_form() {
        assert_eq!("upper".parse::<CaseFirst>().unwrap(), CaseFirst::Upper);
        assert_eq!("off".parse::<CaseFirst>().unwrap(), CaseFirst::Off);
        assert_eq!(Strength::try_from(5).unwrap(), Strength::Identical);
        assert_eq!(
            "non-ignorable".parse::<Alternate>().unwrap(),
            Alternate::NonIgnorable
        );
        assert_eq!("space".parse::<MaxVariable>().unwrap(), MaxVariable::Space);
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        assert!(matches!(
            "UPPER".parse::<CaseFirst>(),
            Err(Error::InvalidOptionValue { ref field, .. }) if field == "collation.caseFirst"
        ));
        assert!(matches!(
            Strength::try_from(0),
            Err(Error::InvalidOptionValue { ref field, .. }) if field == "collation.strength"
        ));
        assert!("ignorable".parse::<Alternate>().is_err());
        assert!("tab".parse::<MaxVariable>().is_err());
    }

    #[test]
    fn spec_carries_only_present_fields() {
        let request = IndexCreateRequest {
            keys: doc! { "email": 1 },
            options: ReconstructedOptions {
                name: Some("email_1".to_string()),
                unique: Some(true),
                expire_after: Some(Duration::from_secs(3600)),
                version: Some(2),
                ..Default::default()
            },
        };
        assert_eq!(request.name(), Some("email_1"));

        assert_eq!(
            request.to_document(),
            doc! {
                "key": { "email": 1 },
                "unique": true,
                "name": "email_1",
                "expireAfterSeconds": 3600,
                "v": 2,
            }
        );
    }

    #[test]
    fn spec_keeps_fractional_bucket_size() {
        let request = IndexCreateRequest {
            keys: doc! { "pos": "geoHaystack", "type": 1 },
            options: ReconstructedOptions {
                name: Some("pos_geoHaystack_type_1".to_string()),
                bucket_size: Some(0.5),
                ..Default::default()
            },
        };

        let spec = request.to_document();
        assert_eq!(spec.get("bucketSize"), Some(&Bson::Double(0.5)));
        assert_eq!(spec.get_document("key").unwrap(), &doc! { "pos": "geoHaystack", "type": 1 });
    }

    #[test]
    fn spec_collation_uses_wire_values() {
        let collation = CollationOptions {
            locale: "fr".to_string(),
            case_level: Some(true),
            case_first: Some(CaseFirst::Lower),
            strength: Some(Strength::Secondary),
            numeric_ordering: Some(true),
            alternate: Some(Alternate::NonIgnorable),
            max_variable: Some(MaxVariable::Punct),
            normalization: Some(false),
            backwards: Some(true),
        };

        assert_eq!(
            collation.to_document(),
            doc! {
                "locale": "fr",
                "caseLevel": true,
                "caseFirst": "lower",
                "strength": 2,
                "numericOrdering": true,
                "alternate": "non-ignorable",
                "maxVariable": "punct",
                "normalization": false,
                "backwards": true,
            }
        );
    }

    #[test]
    fn large_ttl_goes_out_as_int64() {
        let options = ReconstructedOptions {
            expire_after: Some(Duration::from_secs(u64::from(u32::MAX))),
            ..Default::default()
        };
        let request = IndexCreateRequest {
            keys: doc! { "t": 1 },
            options,
        };

        assert_eq!(
            request.to_document().get("expireAfterSeconds"),
            Some(&Bson::Int64(i64::from(u32::MAX)))
        );
    }
}
