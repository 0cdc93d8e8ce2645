//! Fatal error type for the translator.
//!
//! Everything listed here aborts the whole translation run. Malformed but
//! parseable diagrams never end up here: those produce warnings attached to
//! the state machine instead (see `verify`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] crate::parser::ParseError),
    #[error("cannot derive a class name from '{0}'")]
    BadStem(String),
    #[error("code-injection tag '{0}' is not managed")]
    UnknownTag(String),
    #[error("model dump failed: {0}")]
    Dump(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_reports_path() {
        let cause = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::Io {
            path: "missing.plantuml".to_string(),
            source: cause,
        };
        assert_eq!(err.to_string(), "cannot read 'missing.plantuml': gone");
    }

    #[test]
    fn test_dump_error_wraps_serde_json() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(cause);
        assert!(err.to_string().starts_with("model dump failed:"));
    }
}
