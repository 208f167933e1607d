//! Error types for contract declaration, loading and request processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading declaration files.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid declaration: {source}")]
    InvalidDeclaration {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors raised while declaring a treaty or serving a request against it.
///
/// `Schema` errors surface while a declaration is being built and are fatal
/// to startup. Everything else is raised per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreatyError {
    /// The declaration itself is malformed.
    #[error("{message}")]
    Schema { message: String },

    /// Request or response data violates a declared constraint.
    #[error("{message}")]
    Validation { message: String },

    /// The resolved version is retired.
    #[error("{message}")]
    Deprecated { message: String },

    /// The executor could not be resolved or failed while running.
    #[error("{message}")]
    Execution { message: String },

    /// A named executor reference is not registered.
    #[error("{message}")]
    NotFound { message: String },

    #[error("Current version is required for validation")]
    VersionRequired,

    #[error("Version {version} not found in treaty definition")]
    VersionNotFound { version: String },
}

impl TreatyError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Prepends context to a validation message, leaving other kinds untouched.
    pub(crate) fn with_context(self, prefix: &str) -> Self {
        match self {
            Self::Validation { message } => Self::Validation {
                message: format!("{prefix}: {message}"),
            },
            other => other,
        }
    }

    /// Conventional HTTP status for a transport to answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 422,
            Self::Deprecated { .. } => 410,
            Self::NotFound { .. } | Self::VersionNotFound { .. } => 404,
            Self::VersionRequired => 400,
            Self::Schema { .. } | Self::Execution { .. } => 500,
        }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Schema { .. } => 2,
            _ => 1,
        }
    }
}

impl From<std::convert::Infallible> for TreatyError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("treaty.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = LoadError::InvalidJson { source };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn treaty_error_display() {
        let err = TreatyError::VersionNotFound {
            version: "9.9.9".into(),
        };
        assert_eq!(
            err.to_string(),
            "Version 9.9.9 not found in treaty definition"
        );
        assert_eq!(
            TreatyError::VersionRequired.to_string(),
            "Current version is required for validation"
        );
    }

    #[test]
    fn with_context_only_wraps_validation() {
        let err = TreatyError::validation("boom").with_context("Error in array 'tags' at index 1");
        assert_eq!(err.to_string(), "Error in array 'tags' at index 1: boom");

        let err = TreatyError::schema("bad").with_context("ignored");
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(TreatyError::validation("x").http_status(), 422);
        assert_eq!(
            TreatyError::Deprecated {
                message: "x".into()
            }
            .http_status(),
            410
        );
        assert_eq!(TreatyError::not_found("x").http_status(), 404);
        assert_eq!(TreatyError::execution("x").http_status(), 500);
    }
}
