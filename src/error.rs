//! Error types for assetfs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the overlay engine and its configuration layer
#[derive(Debug, Error)]
pub enum Error {
    /// Virtual path matched no physical root in any reachable node
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem failure while probing or listing a physical path
    #[error("IO error at {}: {source}", .path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The caller's context was cancelled before the call finished
    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid namespace name: {0:?}")]
    InvalidNamespace(String),

    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("path already registered: {0}")]
    PathAlreadyRegistered(String),

    #[error("invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap an IO error with the physical path it happened on
    pub fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::IoAt {
            path: path.into(),
            source,
        }
    }

    /// True if this is a miss rather than a broken filesystem
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
        Error::IoAt { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        let miss = Error::NotFound("themes/app.css".to_string());
        assert!(miss.is_not_found());
        assert_eq!(miss.to_string(), "not found: themes/app.css");

        let broken = Error::io_at(
            "/srv/assets",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!broken.is_not_found());
        assert!(broken.to_string().contains("/srv/assets"));
    }
}
