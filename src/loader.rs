//! Declaration loading from various sources.
//!
//! Handles loading declarations from files, strings, and HTTP URLs.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::declaration::TreatyDeclaration;
use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = content.len(), "loaded file");

    load_json_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a JSON document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the response
/// isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_json_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    debug!(url, "fetching");
    let response = client.get(url).send().map_err(network)?;

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(network)?;

    response.json().map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a JSON document from a file path or URL.
///
/// # Errors
///
/// Same as [`load_json`], or [`load_json_url`] for URLs.
pub fn load_json_auto(source: &str) -> Result<Value, LoadError> {
    #[cfg(feature = "remote")]
    if is_url(source) {
        return load_json_url(source);
    }

    load_json(Path::new(source))
}

/// Parse an already loaded document into a declaration.
///
/// # Errors
///
/// Returns `LoadError::InvalidDeclaration` when the document doesn't have
/// the declaration shape.
pub fn parse_declaration(value: Value) -> Result<TreatyDeclaration, LoadError> {
    TreatyDeclaration::from_value(value).map_err(|source| LoadError::InvalidDeclaration { source })
}

/// Load a declaration from a file path.
///
/// # Errors
///
/// Same as [`load_json`] and [`parse_declaration`].
pub fn load_declaration(path: &Path) -> Result<TreatyDeclaration, LoadError> {
    parse_declaration(load_json(path)?)
}

/// Load a declaration from a JSON string.
///
/// # Errors
///
/// Same as [`load_json_str`] and [`parse_declaration`].
pub fn load_declaration_str(content: &str) -> Result<TreatyDeclaration, LoadError> {
    parse_declaration(load_json_str(content)?)
}

/// Load a declaration from a file path or URL.
///
/// # Errors
///
/// Same as [`load_json_auto`] and [`parse_declaration`].
pub fn load_declaration_auto(source: &str) -> Result<TreatyDeclaration, LoadError> {
    parse_declaration(load_json_auto(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"{"versions": [{"version": "1", "default": true}]}"#;

    #[test]
    fn load_json_valid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"versions": []}}"#).unwrap();

        let value = load_json(file.path()).unwrap();
        assert_eq!(value["versions"], serde_json::json!([]));
    }

    #[test]
    fn load_json_not_found() {
        let result = load_json(Path::new("/nonexistent/treaty.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_json_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_json(file.path());
        assert!(matches!(result, Err(LoadError::InvalidJson { .. })));
    }

    #[test]
    fn load_declaration_str_valid() {
        let declaration = load_declaration_str(MINIMAL).unwrap();
        assert_eq!(declaration.versions.len(), 1);
        assert!(declaration.versions[0].default);
        assert_eq!(declaration.name, "treaty");
    }

    #[test]
    fn load_declaration_wrong_shape() {
        let result = load_declaration_str(r#"{"versions": {"1": {}}}"#);
        let err = result.unwrap_err();
        assert!(matches!(err, LoadError::InvalidDeclaration { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_file_exit_code() {
        let err = load_declaration(Path::new("/nonexistent/treaty.json")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn is_url_https() {
        assert!(is_url("https://example.com/treaty.json"));
    }

    #[test]
    fn is_url_http() {
        assert!(is_url("http://example.com/treaty.json"));
    }

    #[test]
    fn is_url_file_path() {
        assert!(!is_url("/path/to/treaty.json"));
        assert!(!is_url("./treaty.json"));
        assert!(!is_url("treaty.json"));
    }

    #[test]
    fn load_declaration_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", MINIMAL).unwrap();

        let declaration = load_declaration_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(declaration.versions.len(), 1);
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_declaration_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/treaty.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(MINIMAL)
                .create();

            let url = format!("{}/treaty.json", server.url());
            let declaration = load_declaration_auto(&url).unwrap();
            assert_eq!(declaration.versions.len(), 1);
            mock.assert();
        }

        #[test]
        fn load_json_url_404() {
            let mut server = mockito::Server::new();
            server.mock("GET", "/missing.json").with_status(404).create();

            let result = load_json_url(&format!("{}/missing.json", server.url()));
            let err = result.unwrap_err();
            assert!(matches!(err, LoadError::NetworkError { .. }));
            assert_eq!(err.exit_code(), 3);
        }

        #[test]
        fn load_json_url_not_json() {
            let mut server = mockito::Server::new();
            server
                .mock("GET", "/page")
                .with_status(200)
                .with_body("<html></html>")
                .create();

            let result = load_json_url(&format!("{}/page", server.url()));
            assert!(matches!(result, Err(LoadError::NetworkError { .. })));
        }
    }
}
