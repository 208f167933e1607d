//! Core types shared by the schema model and the orchestrators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::Format;
use crate::strategy::Strategy;

/// Name of the root scope, and of the element attribute of a scalar array.
pub const SELF_SCOPE: &str = "_self";

/// Default ceiling for attribute nesting.
pub const DEFAULT_MAX_NESTING_LEVEL: usize = 3;

/// Default status attached to a response block.
pub const DEFAULT_STATUS: u16 = 200;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Integer,
    Boolean,
    Object,
    Array,
    Datetime,
}

impl AttributeType {
    pub const ALL: &'static [AttributeType] = &[
        AttributeType::String,
        AttributeType::Integer,
        AttributeType::Boolean,
        AttributeType::Object,
        AttributeType::Array,
        AttributeType::Datetime,
    ];

    /// Parse a type token (`"string"`, `"integer"`, ...).
    ///
    /// Returns `None` for unknown tokens (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(AttributeType::String),
            "integer" => Some(AttributeType::Integer),
            "boolean" => Some(AttributeType::Boolean),
            "object" => Some(AttributeType::Object),
            "array" => Some(AttributeType::Array),
            "datetime" => Some(AttributeType::Datetime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Integer => "integer",
            AttributeType::Boolean => "boolean",
            AttributeType::Object => "object",
            AttributeType::Array => "array",
            AttributeType::Datetime => "datetime",
        }
    }

    /// Whether attributes of this type may hold children.
    pub fn is_container(&self) -> bool {
        matches!(self, AttributeType::Object | AttributeType::Array)
    }

    /// Whether a concrete value has this type. Datetimes travel as RFC 3339 strings.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (AttributeType::Boolean, Value::Bool(_)) => true,
            (AttributeType::Object, Value::Object(_)) => true,
            (AttributeType::Array, Value::Array(_)) => true,
            (AttributeType::Datetime, Value::String(s)) => Format::DateTime.is_valid(s),
            _ => false,
        }
    }

    pub(crate) fn known_list() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the data being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }

    /// Create direction from a request flag (true = Request, false = Response).
    pub fn from_request_flag(is_request: bool) -> Self {
        if is_request {
            Direction::Request
        } else {
            Direction::Response
        }
    }
}

/// Where an attribute was declared.
///
/// The flavors differ only in the default of the `required` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    Request,
    Response,
    Entity,
}

impl Flavor {
    /// Value of `required` when the declaration leaves it out.
    pub fn required_by_default(&self) -> bool {
        match self {
            Flavor::Request | Flavor::Entity => true,
            Flavor::Response => false,
        }
    }
}

impl From<Direction> for Flavor {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Request => Flavor::Request,
            Direction::Response => Flavor::Response,
        }
    }
}

/// Declaration-time settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deepest nesting level an attribute may be declared at.
    pub max_nesting_level: usize,
    /// Strategy for versions that don't declare one.
    pub default_strategy: Strategy,
    /// Status for response blocks that don't declare one.
    pub default_status: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_nesting_level: DEFAULT_MAX_NESTING_LEVEL,
            default_strategy: Strategy::Adapter,
            default_status: DEFAULT_STATUS,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_nesting_level(mut self, level: usize) -> Self {
        self.max_nesting_level = level;
        self
    }

    pub fn default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn default_status(mut self, status: u16) -> Self {
        self.default_status = status;
        self
    }
}
