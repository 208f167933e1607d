//! Semantic versions and per-version declarations.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::TreatyError;
use crate::executor::{Executor, ExecutorRef};
use crate::processor::ProcessorRegistry;
use crate::schema::SchemaFactory;
use crate::strategy::Strategy;
use crate::types::{Config, Flavor};

/// One component of a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Number(u64),
    Text(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Number(n) => write!(f, "{}", n),
            Segment::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Segment {
    fn from(n: u64) -> Self {
        Segment::Number(n)
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Text(s.to_string())
    }
}

/// A version as a list of numeric and textual segments.
///
/// `"1.0.0.rc1"`, `"1.0.0-rc1"` and `[1, 0, 0, "rc", 1]` are the same
/// version; trailing zero segments are insignificant, so `"2"` equals
/// `"2.0.0"`. Textual segments mark prereleases and sort before numbers.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    raw: String,
    segments: Vec<Segment>,
}

impl SemanticVersion {
    /// Parse a dotted version string.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` for blank strings or characters other
    /// than ASCII letters, digits, `.` and `-`.
    pub fn parse(raw: &str) -> Result<Self, TreatyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TreatyError::schema("Version cannot be blank"));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(TreatyError::schema(format!("Malformed version '{}'", raw)));
        }

        let mut segments = Vec::new();
        for part in trimmed.split(['.', '-']).filter(|p| !p.is_empty()) {
            split_runs(part, &mut segments)?;
        }
        if segments.is_empty() {
            return Err(TreatyError::schema(format!("Malformed version '{}'", raw)));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, TreatyError> {
        let raw = segments
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self::parse(&raw)
    }

    /// Accepts a string, a number or an array of segments.
    pub fn from_json(value: &Value) -> Result<Self, TreatyError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => Self::parse(&n.to_string()),
            Value::Array(items) => {
                let segments = items
                    .iter()
                    .map(|item| match item {
                        Value::Number(n) => n.as_u64().map(Segment::Number),
                        Value::String(s) => Some(Segment::Text(s.clone())),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        TreatyError::schema(format!("Malformed version {}", value))
                    })?;
                Self::from_segments(segments)
            }
            other => Err(TreatyError::schema(format!("Malformed version {}", other))),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_prerelease(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Text(_)))
    }

    fn significant(&self) -> &[Segment] {
        let mut end = self.segments.len();
        while end > 1 && self.segments[end - 1] == Segment::Number(0) {
            end -= 1;
        }
        &self.segments[..end]
    }
}

/// Split `rc1` into `rc`, `1`.
fn split_runs(part: &str, segments: &mut Vec<Segment>) -> Result<(), TreatyError> {
    let mut current = String::new();
    let mut numeric = false;
    for c in part.chars() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != numeric {
            segments.push(make_segment(&current, numeric)?);
            current.clear();
        }
        numeric = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        segments.push(make_segment(&current, numeric)?);
    }
    Ok(())
}

fn make_segment(run: &str, numeric: bool) -> Result<Segment, TreatyError> {
    if numeric {
        run.parse::<u64>()
            .map(Segment::Number)
            .map_err(|_| TreatyError::schema(format!("Version segment '{}' is too large", run)))
    } else {
        Ok(Segment::Text(run.to_string()))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        let zero = Segment::Number(0);
        (0..a.len().max(b.len()))
            .map(|i| compare_segments(a.get(i).unwrap_or(&zero), b.get(i).unwrap_or(&zero)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

fn compare_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Number(x), Segment::Number(y)) => x.cmp(y),
        (Segment::Text(x), Segment::Text(y)) => x.cmp(y),
        (Segment::Text(_), Segment::Number(_)) => Ordering::Less,
        (Segment::Number(_), Segment::Text(_)) => Ordering::Greater,
    }
}

impl TryFrom<&str> for SemanticVersion {
    type Error = TreatyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for SemanticVersion {
    type Error = TreatyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<u64> for SemanticVersion {
    type Error = TreatyError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_segments(vec![Segment::Number(value)])
    }
}

impl TryFrom<Vec<Segment>> for SemanticVersion {
    type Error = TreatyError;

    fn try_from(value: Vec<Segment>) -> Result<Self, Self::Error> {
        Self::from_segments(value)
    }
}

/// The full declaration of one version of an endpoint.
#[derive(Debug)]
pub struct VersionFactory {
    version: SemanticVersion,
    summary: Option<String>,
    strategy: Strategy,
    deprecated: bool,
    default: bool,
    executor: Option<ExecutorRef>,
    request: Option<SchemaFactory>,
    response: Option<SchemaFactory>,
}

impl VersionFactory {
    pub fn version(&self) -> &SemanticVersion {
        &self.version
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn executor(&self) -> Option<&ExecutorRef> {
        self.executor.as_ref()
    }

    pub fn request(&self) -> Option<&SchemaFactory> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&SchemaFactory> {
        self.response.as_ref()
    }
}

/// Builder for one [`VersionFactory`].
#[derive(Debug)]
pub struct VersionBuilder {
    config: Config,
    registry: Arc<ProcessorRegistry>,
    factory: VersionFactory,
}

impl VersionBuilder {
    pub fn new(version: SemanticVersion, config: Config, registry: Arc<ProcessorRegistry>) -> Self {
        Self {
            config,
            registry,
            factory: VersionFactory {
                version,
                summary: None,
                strategy: config.default_strategy,
                deprecated: false,
                default: false,
                executor: None,
                request: None,
                response: None,
            },
        }
    }

    pub fn summary(&mut self, summary: impl Into<String>) -> &mut Self {
        self.factory.summary = Some(summary.into());
        self
    }

    /// Set the strategy from its code.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` for unknown codes.
    pub fn strategy(&mut self, code: &str) -> Result<&mut Self, TreatyError> {
        self.factory.strategy = Strategy::parse(code)?;
        Ok(self)
    }

    pub fn with_strategy(&mut self, strategy: Strategy) -> &mut Self {
        self.factory.strategy = strategy;
        self
    }

    /// Mark this version as the one used when no version is requested.
    pub fn default(&mut self) -> &mut Self {
        self.factory.default = true;
        self
    }

    pub fn deprecated(&mut self, deprecated: bool) -> &mut Self {
        self.factory.deprecated = deprecated;
        self
    }

    /// Evaluate `condition` now; the result is fixed for the version's lifetime.
    pub fn deprecated_if(&mut self, condition: impl FnOnce() -> bool) -> &mut Self {
        self.factory.deprecated = condition();
        self
    }

    /// Declare request scopes. Repeated calls merge into one factory.
    pub fn request<F>(&mut self, body: F) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaFactory) -> Result<(), TreatyError>,
    {
        let (config, registry) = (self.config, Arc::clone(&self.registry));
        let factory = self
            .factory
            .request
            .get_or_insert_with(|| SchemaFactory::new(Flavor::Request, &config, registry));
        body(factory)?;
        Ok(self)
    }

    /// Declare response scopes answered with `status`.
    pub fn response<F>(&mut self, status: u16, body: F) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaFactory) -> Result<(), TreatyError>,
    {
        let (config, registry) = (self.config, Arc::clone(&self.registry));
        let factory = self
            .factory
            .response
            .get_or_insert_with(|| SchemaFactory::new(Flavor::Response, &config, registry));
        factory.set_status(status);
        body(factory)?;
        Ok(self)
    }

    pub fn delegate_to(&mut self, executor: impl Into<Executor>) -> &mut Self {
        self.factory.executor = Some(ExecutorRef::new(executor.into()));
        self
    }

    /// Method invoked on a service executor (default `call`).
    pub fn method(&mut self, method: impl Into<String>) -> &mut Self {
        if let Some(executor) = self.factory.executor.as_mut() {
            executor.set_method(method);
        }
        self
    }

    pub fn build(self) -> VersionFactory {
        self.factory
    }
}

/// All versions of one endpoint.
#[derive(Debug, Default)]
pub struct VersionCollection {
    versions: Vec<VersionFactory>,
}

impl VersionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a version.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` when the version is already declared or
    /// when a second default is added.
    pub fn push(&mut self, factory: VersionFactory) -> Result<(), TreatyError> {
        if self.find(factory.version()).is_some() {
            return Err(TreatyError::schema(format!(
                "Version {} is declared more than once",
                factory.version()
            )));
        }
        if factory.is_default() {
            if let Some(existing) = self.find_default() {
                return Err(TreatyError::schema(format!(
                    "Version {} cannot be the default: version {} already is",
                    factory.version(),
                    existing.version()
                )));
            }
        }
        self.versions.push(factory);
        Ok(())
    }

    pub fn find(&self, version: &SemanticVersion) -> Option<&VersionFactory> {
        self.versions.iter().find(|f| f.version() == version)
    }

    pub fn find_default(&self) -> Option<&VersionFactory> {
        self.versions.iter().find(|f| f.is_default())
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionFactory> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
