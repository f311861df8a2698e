//! Error type shared by the quoter library.

use std::path::PathBuf;

/// Everything that can go wrong inside the quote book.
///
/// Validation and import errors carry the message shown to the user; the
/// rest wrap the underlying failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A required field of the add form was blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Please fill in both the quote and the category.")]
pub struct ValidationError;

/// An uploaded file could not be taken into the collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid JSON file: {0}")]
    Malformed(String),

    #[error("Invalid file format: expected an array of quotes.")]
    NotArray,

    #[error("Invalid file format: entry {index} is not a quote object.")]
    NotObject { index: usize },
}

#[cfg(feature = "sync")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_matches_form_alert() {
        let err: Error = ValidationError.into();
        assert_eq!(
            err.to_string(),
            "Please fill in both the quote and the category."
        );
    }

    #[test]
    fn import_errors_are_user_readable() {
        assert_eq!(
            ImportError::NotArray.to_string(),
            "Invalid file format: expected an array of quotes."
        );
        assert!(
            ImportError::NotObject { index: 3 }
                .to_string()
                .contains("entry 3")
        );
    }
}
