//! Attribute options: raw declarations and their canonical form.
//!
//! Options may be declared in simple mode (`required: true`, `in: [...]`) or
//! advanced mode (`required: {is: true, message: "..."}`). [`normalize`]
//! turns either into one [`NormalizedOption`] per option.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Zero-argument value provider, e.g. for computed defaults.
pub type Provider = Arc<dyn Fn() -> Value + Send + Sync>;

/// Value transformer used by the `transform` option.
pub type Transformer = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// Key under which an option keeps its value in advanced mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Is,
    In,
}

impl ValueKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKey::Is => "is",
            ValueKey::In => "in",
        }
    }

    /// Value key used by a canonical option name.
    pub fn for_option(name: &str) -> Self {
        if name == INCLUSION {
            ValueKey::In
        } else {
            ValueKey::Is
        }
    }
}

/// Canonical name of the inclusion option.
pub const INCLUSION: &str = "inclusion";

/// Simple-mode alias of [`INCLUSION`].
pub const INCLUSION_ALIAS: &str = "in";

/// A declared option value.
#[derive(Clone)]
pub enum OptionValue {
    Json(Value),
    Provider(Provider),
    Transformer(Transformer),
}

impl OptionValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            OptionValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Json(value) => f.debug_tuple("Json").field(value).finish(),
            OptionValue::Provider(_) => f.write_str("Provider(..)"),
            OptionValue::Transformer(_) => f.write_str("Transformer(..)"),
        }
    }
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (OptionValue::Json(a), OptionValue::Json(b)) => a == b,
            (OptionValue::Provider(a), OptionValue::Provider(b)) => Arc::ptr_eq(a, b),
            (OptionValue::Transformer(a), OptionValue::Transformer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        OptionValue::Json(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Json(Value::Bool(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Json(Value::String(value.to_string()))
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Json(Value::String(value))
    }
}

/// Raw options of one attribute, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: Vec<(String, OptionValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option. A later value for the same key replaces the earlier one.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Helper sugar for `required: true`.
    pub fn required(self) -> Self {
        self.set("required", true)
    }

    /// Helper sugar for `required: false`.
    pub fn optional(self) -> Self {
        self.set("required", false)
    }

    /// Apply a helper symbol unless the option was already set explicitly.
    pub fn helper(self, helper: Helper) -> Self {
        if self.contains("required") {
            return self;
        }
        match helper {
            Helper::Required => self.required(),
            Helper::Optional => self.optional(),
        }
    }

    pub fn inclusion(self, allowed: Value) -> Self {
        self.set(INCLUSION_ALIAS, allowed)
    }

    pub fn format(self, name: &str) -> Self {
        self.set("format", name)
    }

    pub fn rename(self, target: &str) -> Self {
        self.set("as", target)
    }

    pub fn default_value(self, value: Value) -> Self {
        self.set("default", value)
    }

    pub fn default_with(self, provider: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.set("default", OptionValue::Provider(Arc::new(provider)))
    }

    pub fn cast(self, target: &str) -> Self {
        self.set("cast", target)
    }

    pub fn transform(
        self,
        transformer: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.set("transform", OptionValue::Transformer(Arc::new(transformer)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build options from a JSON object, as found in declaration files.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        map.iter().fold(Self::new(), |options, (key, value)| {
            options.set(key.clone(), value.clone())
        })
    }
}

/// Sugar symbols accepted next to an attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    Required,
    Optional,
}

impl Helper {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "required" => Some(Helper::Required),
            "optional" => Some(Helper::Optional),
            _ => None,
        }
    }
}

/// An option in canonical `{value_key: value, message}` form.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedOption {
    pub value_key: ValueKey,
    pub value: OptionValue,
    pub message: Option<String>,
}

impl NormalizedOption {
    pub fn json(&self) -> Option<&Value> {
        self.value.as_json()
    }

    /// Advanced-mode representation of this option.
    pub fn to_advanced(&self) -> OptionValue {
        match &self.value {
            OptionValue::Json(value) => {
                let mut map = Map::new();
                map.insert(self.value_key.as_str().to_string(), value.clone());
                map.insert(
                    "message".to_string(),
                    self.message.clone().map_or(Value::Null, Value::String),
                );
                OptionValue::Json(Value::Object(map))
            }
            other => other.clone(),
        }
    }
}

/// Normalized options of one attribute, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: Vec<(String, NormalizedOption)>,
}

impl OptionSet {
    pub fn get(&self, name: &str) -> Option<&NormalizedOption> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, option)| option)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedOption)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert_if_absent(&mut self, name: &str, value: Value) {
        if !self.contains(name) {
            self.entries.push((
                name.to_string(),
                NormalizedOption {
                    value_key: ValueKey::for_option(name),
                    value: OptionValue::Json(value),
                    message: None,
                },
            ));
        }
    }

    /// Back to raw advanced-mode options.
    pub fn to_options(&self) -> Options {
        self.entries
            .iter()
            .fold(Options::new(), |options, (name, option)| {
                options.set(name.clone(), option.to_advanced())
            })
    }
}

/// Canonicalize raw options. Never fails: malformed shapes are reported by
/// the schema phase of the owning processor.
///
/// `in` and `inclusion` name the same option; the later one wins and keeps
/// the position of the first.
pub fn normalize(options: &Options) -> OptionSet {
    let mut entries: Vec<(String, NormalizedOption)> = Vec::new();
    for (key, raw) in options.iter() {
        let name = if key == INCLUSION_ALIAS { INCLUSION } else { key };
        let option = normalize_value(ValueKey::for_option(name), raw);
        match entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = option,
            None => entries.push((name.to_string(), option)),
        }
    }
    OptionSet { entries }
}

fn normalize_value(value_key: ValueKey, raw: &OptionValue) -> NormalizedOption {
    if let OptionValue::Json(Value::Object(map)) = raw {
        if let Some(value) = map.get(value_key.as_str()) {
            return NormalizedOption {
                value_key,
                value: OptionValue::Json(value.clone()),
                message: map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(String::from),
            };
        }
    }
    NormalizedOption {
        value_key,
        value: raw.clone(),
        message: None,
    }
}
