use std::fmt;

/// Failure kinds raised while reading, rebuilding or creating indexes.
///
/// These never escape the copy operations directly; they are wrapped in an
/// [`IndexCopyError`] and reachable through its `cause()`/`source()`.
#[derive(Debug)]
pub enum Error {
    StoreAccess(mongodb::error::Error),
    Bson(bson::document::ValueAccessError),
    Ser(bson::ser::Error),
    WriteConcern(bson::Document),
    MissingIndexes(Vec<String>),
    InvalidOptionValue { field: String, reason: String },
    UnrecognizedField(String),
}

impl Error {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Error::InvalidOptionValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::StoreAccess(ref err) => Some(err),
            Error::Bson(ref err) => Some(err),
            Error::Ser(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::StoreAccess(ref err) => write!(f, "store access failed: {}", err),
            Error::Bson(ref err) => write!(f, "malformed document: {}", err),
            Error::Ser(ref err) => write!(f, "could not encode command: {}", err),
            Error::WriteConcern(ref err) => write!(f, "write concern error: {}", err),
            Error::MissingIndexes(ref names) => write!(
                f,
                "Not all requested indexes are available in source collection. Missing indexes: [{}]",
                names.join(", ")
            ),
            Error::InvalidOptionValue {
                ref field,
                ref reason,
            } => write!(f, "invalid value for index option '{}': {}", field, reason),
            Error::UnrecognizedField(ref field) => {
                write!(f, "unrecognized index descriptor field '{}'", field)
            }
        }
    }
}

impl From<bson::document::ValueAccessError> for Error {
    fn from(err: bson::document::ValueAccessError) -> Error {
        Error::Bson(err)
    }
}

impl From<bson::ser::Error> for Error {
    fn from(err: bson::ser::Error) -> Error {
        Error::Ser(err)
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Error {
        Error::StoreAccess(err)
    }
}

/// The single error returned by the copy operations.
#[derive(Debug)]
pub struct IndexCopyError {
    cause: Error,
}

impl IndexCopyError {
    pub const MESSAGE: &'static str =
        "Could not copy MongoDB indexes from source collection to destination collection";

    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

impl fmt::Display for IndexCopyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

impl std::error::Error for IndexCopyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl From<Error> for IndexCopyError {
    fn from(cause: Error) -> IndexCopyError {
        IndexCopyError { cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn copy_error_keeps_cause() {
        let err = IndexCopyError::from(Error::MissingIndexes(vec!["a_1".into(), "b_1".into()]));

        assert_eq!(err.to_string(), IndexCopyError::MESSAGE);
        assert!(matches!(err.cause(), Error::MissingIndexes(names) if names.len() == 2));
        let source = err.source().expect("cause is exposed as source");
        assert!(source.to_string().contains("Missing indexes: [a_1, b_1]"));
    }

    #[test]
    fn bson_access_message_is_neutral() {
        let reply = bson::doc! { "ok": 1 };
        let err: Error = reply.get_document("cursor").unwrap_err().into();

        assert!(err.to_string().starts_with("malformed document:"));
    }

    #[test]
    fn store_access_wraps_driver_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err: Error = mongodb::error::Error::from(io).into();

        assert!(matches!(err, Error::StoreAccess(_)));
        assert!(err.source().is_some());
    }
}
