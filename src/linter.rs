//! Declaration linting - static analysis of treaty declaration files.
//!
//! Validates declaration files for:
//! - JSON syntax errors
//! - Documents that don't have the declaration shape
//! - Schema errors (unknown types or options, bad nesting, malformed or
//!   duplicate versions)
//! - Versions that can never be served successfully

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::declaration::TreatyDeclaration;
use crate::error::LoadError;
use crate::executor::ExecutorRegistry;
use crate::loader::{load_json, parse_declaration};
use crate::version::SemanticVersion;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/versions/0")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, warnings are treated as errors.
/// Returns aggregated results for all files.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_declaration_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result, Severity::Error);
        total_warnings += count(&file_result, Severity::Warning);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single declaration file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();
    let report = Reporter { file };

    match load_json(file).and_then(parse_declaration) {
        Ok(declaration) => check_declaration(&declaration, &report, &mut diagnostics),
        Err(e @ LoadError::InvalidDeclaration { .. }) => {
            diagnostics.push(report.error("E002", "/", format!("declaration error: {}", e)));
        }
        Err(e @ LoadError::InvalidJson { .. }) => {
            diagnostics.push(report.error("E001", "/", format!("syntax error: {}", e)));
        }
        Err(e) => {
            diagnostics.push(report.error("E001", "/", format!("unreadable file: {}", e)));
        }
    }
    debug!(file = %file.display(), diagnostics = diagnostics.len(), "linted");

    let has_errors = diagnostics.iter().any(|d| d.severity == Severity::Error);
    let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);

    let status = if has_errors {
        FileStatus::Error
    } else if has_warnings {
        FileStatus::Warning
    } else {
        FileStatus::Ok
    };

    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

// --- Internal implementation ---

struct Reporter<'a> {
    file: &'a Path,
}

impl Reporter<'_> {
    fn diagnostic(
        &self,
        severity: Severity,
        code: &str,
        path: &str,
        message: String,
    ) -> Diagnostic {
        Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path: path.to_string(),
            message,
        }
    }

    fn error(&self, code: &str, path: &str, message: String) -> Diagnostic {
        self.diagnostic(Severity::Error, code, path, message)
    }

    fn warning(&self, code: &str, path: &str, message: String) -> Diagnostic {
        self.diagnostic(Severity::Warning, code, path, message)
    }
}

fn count(result: &FileResult, severity: Severity) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}

fn check_declaration(
    declaration: &TreatyDeclaration,
    report: &Reporter,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Build versions one at a time so schema errors point at their version
    let mut versions_ok = true;
    for (index, version) in declaration.versions.iter().enumerate() {
        let path = format!("/versions/{}", index);
        let single = TreatyDeclaration {
            name: declaration.name.clone(),
            config: declaration.config,
            versions: vec![version.clone()],
        };
        if let Err(e) = single.build(ExecutorRegistry::new()) {
            versions_ok = false;
            diagnostics.push(report.error("E003", &path, format!("schema error: {}", e)));
            continue;
        }

        if version.delegate_to.is_none() {
            diagnostics.push(report.warning(
                "W001",
                &path,
                format!(
                    "version {} has no delegate_to; calls to it always fail",
                    label(&version.version)
                ),
            ));
        }
        if version.default && version.deprecated {
            diagnostics.push(report.warning(
                "W003",
                &path,
                format!("default version {} is deprecated", label(&version.version)),
            ));
        }
    }

    // Cross-version checks: duplicates, more than one default
    if versions_ok {
        if let Err(e) = declaration.build(ExecutorRegistry::new()) {
            diagnostics.push(report.error("E003", "/versions", format!("schema error: {}", e)));
        }
    }

    if !declaration.versions.iter().any(|v| v.default) {
        diagnostics.push(report.warning(
            "W002",
            "/versions",
            "no default version; requests must always name a version".to_string(),
        ));
    }
}

fn label(version: &serde_json::Value) -> String {
    SemanticVersion::from_json(version)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| version.to_string())
}

/// Collect all .json files in a path (file or directory).
fn collect_declaration_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn lint_content(content: &str) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap())
    }

    #[test]
    fn lint_valid_declaration() {
        let result = lint_content(
            r#"{
            "name": "users#create",
            "versions": [{
                "version": "1.0",
                "default": true,
                "request": [{"scope": "user", "attributes": [
                    {"type": "string", "name": "email", "options": {"format": "email"}}
                ]}],
                "delegate_to": "users/create"
            }]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let result = lint_content("{ not valid json }");
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
        assert!(result.diagnostics[0].message.starts_with("syntax error:"));
    }

    #[test]
    fn lint_unreadable_file_is_not_a_syntax_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone.json");
        let result = lint_file(&missing, dir.path());
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "E001");
        assert!(result.diagnostics[0].message.starts_with("unreadable file:"));
    }

    #[test]
    fn lint_wrong_shape() {
        let result =
            lint_content(r#"{"versions": [{"version": "1", "request": {"title": "string"}}]}"#);
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "E002");
    }

    #[test]
    fn lint_unknown_type_points_at_version() {
        let result = lint_content(
            r#"{"versions": [
                {"version": "1", "default": true, "delegate_to": "a/b"},
                {"version": "2", "delegate_to": "a/b", "request": [{"attributes": [
                    {"type": "decimal", "name": "price"}
                ]}]}
            ]}"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diagnostic = result.diagnostics.iter().find(|d| d.code == "E003").unwrap();
        assert_eq!(diagnostic.path, "/versions/1");
        assert!(diagnostic.message.contains("Unknown type 'decimal'"));
    }

    #[test]
    fn lint_duplicate_versions() {
        let result = lint_content(
            r#"{"versions": [
                {"version": "1.0", "default": true, "delegate_to": "a/b"},
                {"version": "1", "delegate_to": "a/b"}
            ]}"#,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diagnostic = result.diagnostics.iter().find(|d| d.code == "E003").unwrap();
        assert_eq!(diagnostic.path, "/versions");
    }

    #[test]
    fn lint_missing_executor_and_default_warnings() {
        let result = lint_content(r#"{"versions": [{"version": "1"}]}"#);
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W001"));
        assert!(result.diagnostics.iter().any(|d| d.code == "W002"));
    }

    #[test]
    fn lint_deprecated_default_warning() {
        let result = lint_content(
            r#"{"versions": [{"version": "1", "default": true, "deprecated": true, "delegate_to": "a/b"}]}"#,
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W003"));
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        std::fs::write(
            dir.path().join("valid.json"),
            r#"{"versions": [{"version": "1", "default": true, "delegate_to": "a/b"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("treaty.json");
        // Warning only (no default, no executor)
        std::fs::write(&file_path, r#"{"versions": [{"version": "1"}]}"#).unwrap();

        // Non-strict: warnings don't cause failure
        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        // Strict: warnings cause failure
        let result = lint(&file_path, true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
