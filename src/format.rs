//! Named string formats checked by the `format` option.
//!
//! Standard formats are delegated to `jsonschema`'s format validators;
//! `password` and `boolean` are checked with regular expressions.

use std::collections::HashMap;
use std::sync::OnceLock;

use jsonschema::Validator;
use regex::Regex;
use serde_json::{json, Value};

/// A named format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Email,
    Uuid,
    Date,
    Time,
    DateTime,
    Duration,
    Password,
    Boolean,
}

impl Format {
    pub const ALL: &'static [Format] = &[
        Format::Email,
        Format::Uuid,
        Format::Date,
        Format::Time,
        Format::DateTime,
        Format::Duration,
        Format::Password,
        Format::Boolean,
    ];

    /// Parse a format name. `date-time` is accepted as an alias of `datetime`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "email" => Some(Format::Email),
            "uuid" => Some(Format::Uuid),
            "date" => Some(Format::Date),
            "time" => Some(Format::Time),
            "datetime" | "date-time" => Some(Format::DateTime),
            "duration" => Some(Format::Duration),
            "password" => Some(Format::Password),
            "boolean" => Some(Format::Boolean),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Email => "email",
            Format::Uuid => "uuid",
            Format::Date => "date",
            Format::Time => "time",
            Format::DateTime => "datetime",
            Format::Duration => "duration",
            Format::Password => "password",
            Format::Boolean => "boolean",
        }
    }

    /// JSON Schema format keyword, for formats jsonschema knows.
    fn schema_keyword(&self) -> Option<&'static str> {
        match self {
            Format::Email => Some("email"),
            Format::Uuid => Some("uuid"),
            Format::Date => Some("date"),
            Format::Time => Some("time"),
            Format::DateTime => Some("date-time"),
            Format::Duration => Some("duration"),
            Format::Password | Format::Boolean => None,
        }
    }

    /// Check a raw string against this format.
    pub fn is_valid(&self, raw: &str) -> bool {
        match self {
            Format::Password => {
                raw.chars().count() >= 8 && password_rules().iter().all(|re| re.is_match(raw))
            }
            Format::Boolean => boolean_pattern().is_some_and(|re| re.is_match(raw)),
            other => other
                .schema_keyword()
                .and_then(|keyword| format_validators().get(keyword))
                .is_some_and(|validator| validator.is_valid(&Value::String(raw.to_string()))),
        }
    }

    pub(crate) fn known_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn format_validators() -> &'static HashMap<&'static str, Validator> {
    static VALIDATORS: OnceLock<HashMap<&'static str, Validator>> = OnceLock::new();
    VALIDATORS.get_or_init(|| {
        Format::ALL
            .iter()
            .filter_map(|f| f.schema_keyword())
            .filter_map(|keyword| {
                let schema = json!({
                    "$schema": "https://json-schema.org/draft/2020-12/schema",
                    "type": "string",
                    "format": keyword
                });
                jsonschema::options()
                    .should_validate_formats(true)
                    .build(&schema)
                    .ok()
                    .map(|validator| (keyword, validator))
            })
            .collect()
    })
}

// At least one lowercase letter, one uppercase letter and one digit.
fn password_rules() -> &'static [Regex] {
    static RULES: OnceLock<Vec<Regex>> = OnceLock::new();
    RULES.get_or_init(|| {
        ["[a-z]", "[A-Z]", r"\d"]
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

fn boolean_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?i:true|false|1|0|yes|no|on|off)$").ok())
        .as_ref()
}
