//! Option processors and the registry that builds them.
//!
//! Every option of an attribute is handled by one processor. Validators check
//! values, modifiers change them; each exposes the phase hooks it needs and
//! inherits no-ops for the rest.

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::error::TreatyError;
use crate::format::Format;
use crate::option::{NormalizedOption, OptionValue, INCLUSION};
use crate::types::{json_type_name, AttributeType};

/// One option of one attribute.
pub trait OptionProcessor: Send + Sync {
    /// Phase 1: is the declaration itself well formed?
    fn validate_schema(&self) -> Result<(), TreatyError> {
        Ok(())
    }

    /// Phase 2: does a runtime value satisfy the option?
    fn validate_value(&self, _value: &Value) -> Result<(), TreatyError> {
        Ok(())
    }

    /// Phase 3: produce the output value.
    fn transform_value(&self, value: Value) -> Result<Value, TreatyError> {
        Ok(value)
    }

    /// Whether this processor renames the attribute in output.
    fn transforms_name(&self) -> bool {
        false
    }

    fn target_name(&self) -> Option<&str> {
        None
    }
}

/// What a processor is built from.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorContext<'a> {
    pub attribute: &'a str,
    pub attribute_type: AttributeType,
    pub option: &'a NormalizedOption,
}

impl ProcessorContext<'_> {
    /// Custom message if declared, the generated one otherwise.
    pub fn message_or(&self, default: String) -> String {
        self.option.message.clone().unwrap_or(default)
    }
}

/// Builds a processor for one attribute option.
pub type ProcessorFactory =
    Arc<dyn Fn(&ProcessorContext<'_>) -> Box<dyn OptionProcessor> + Send + Sync>;

/// Option name → processor factory, validators ahead of modifiers.
///
/// Registration needs `&mut self`; once the registry is shared behind an
/// `Arc` it is frozen.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    validators: Vec<(String, ProcessorFactory)>,
    modifiers: Vec<(String, ProcessorFactory)>,
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("validators", &self.validator_names())
            .field("modifiers", &self.modifier_names())
            .finish()
    }
}

impl ProcessorRegistry {
    /// A registry without any processors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in validators and modifiers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_validator("required", |ctx| Box::new(RequiredValidator::new(ctx)));
        registry.register_validator("type", |ctx| Box::new(TypeValidator::new(ctx)));
        registry.register_validator(INCLUSION, |ctx| Box::new(InclusionValidator::new(ctx)));
        registry.register_validator("format", |ctx| Box::new(FormatValidator::new(ctx)));
        registry.register_modifier("default", |ctx| Box::new(DefaultModifier::new(ctx)));
        registry.register_modifier("cast", |ctx| Box::new(CastModifier::new(ctx)));
        registry.register_modifier("transform", |ctx| Box::new(TransformModifier::new(ctx)));
        registry.register_modifier("as", |ctx| Box::new(AsModifier::new(ctx)));
        registry
    }

    /// The process-wide registry with the built-ins.
    pub fn shared() -> Arc<ProcessorRegistry> {
        static SHARED: OnceLock<Arc<ProcessorRegistry>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(ProcessorRegistry::with_builtins()))
            .clone()
    }

    pub fn register_validator<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ProcessorContext<'_>) -> Box<dyn OptionProcessor> + Send + Sync + 'static,
    {
        insert(&mut self.validators, name.into(), Arc::new(factory));
        self
    }

    pub fn register_modifier<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ProcessorContext<'_>) -> Box<dyn OptionProcessor> + Send + Sync + 'static,
    {
        insert(&mut self.modifiers, name.into(), Arc::new(factory));
        self
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.entries().any(|(known, _)| known == name)
    }

    pub fn known_names(&self) -> Vec<&str> {
        self.entries().map(|(name, _)| name).collect()
    }

    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn modifier_names(&self) -> Vec<&str> {
        self.modifiers.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// All factories in processing order: validators, then modifiers.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ProcessorFactory)> {
        self.validators
            .iter()
            .chain(self.modifiers.iter())
            .map(|(name, factory)| (name.as_str(), factory))
    }
}

fn insert(list: &mut Vec<(String, ProcessorFactory)>, name: String, factory: ProcessorFactory) {
    match list.iter_mut().find(|(known, _)| *known == name) {
        Some(entry) => entry.1 = factory,
        None => list.push((name, factory)),
    }
}

/// Display a value inside a message: strings bare, everything else as JSON.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a value counts as present for `required`.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

// --- Validators ---

struct RequiredValidator {
    attribute: String,
    declared: Value,
    message: String,
}

impl RequiredValidator {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        Self {
            attribute: ctx.attribute.to_string(),
            declared: ctx.option.json().cloned().unwrap_or(Value::Null),
            message: ctx.message_or(format!(
                "Attribute '{}' is required but was not provided or is empty",
                ctx.attribute
            )),
        }
    }

    fn enabled(&self) -> bool {
        self.declared == Value::Bool(true)
    }
}

impl OptionProcessor for RequiredValidator {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        if self.declared.is_boolean() {
            Ok(())
        } else {
            Err(TreatyError::schema(format!(
                "Option 'required' for attribute '{}' must be true or false, got {}",
                self.attribute,
                json_type_name(&self.declared)
            )))
        }
    }

    fn validate_value(&self, value: &Value) -> Result<(), TreatyError> {
        if !self.enabled() || is_present(value) {
            return Ok(());
        }
        Err(TreatyError::validation(self.message.clone()))
    }
}

struct TypeValidator {
    attribute: String,
    attribute_type: AttributeType,
    declared: Option<Value>,
    custom_message: Option<String>,
}

impl TypeValidator {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        Self {
            attribute: ctx.attribute.to_string(),
            attribute_type: ctx.attribute_type,
            declared: ctx.option.json().cloned(),
            custom_message: ctx.option.message.clone(),
        }
    }
}

impl OptionProcessor for TypeValidator {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        let token = self.declared.as_ref().and_then(Value::as_str);
        match token.and_then(AttributeType::parse) {
            Some(declared) if declared == self.attribute_type => Ok(()),
            Some(declared) => Err(TreatyError::schema(format!(
                "Attribute '{}' is declared as {} but its type option says {}",
                self.attribute, self.attribute_type, declared
            ))),
            None => Err(TreatyError::schema(format!(
                "Unknown type '{}' for attribute '{}'. Allowed types: {}",
                token.map_or_else(
                    || self.declared.as_ref().map_or("null".into(), display_value),
                    String::from
                ),
                self.attribute,
                AttributeType::known_list()
            ))),
        }
    }

    fn validate_value(&self, value: &Value) -> Result<(), TreatyError> {
        if value.is_null() || self.attribute_type.matches(value) {
            return Ok(());
        }
        Err(TreatyError::validation(self.custom_message.clone().unwrap_or_else(|| {
            format!(
                "Attribute '{}' must be {} {}, got {}",
                self.attribute,
                article(self.attribute_type.as_str()),
                self.attribute_type,
                json_type_name(value)
            )
        })))
    }
}

fn article(word: &str) -> &'static str {
    if word.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    }
}

struct InclusionValidator {
    attribute: String,
    allowed: Option<Vec<Value>>,
    custom_message: Option<String>,
}

impl InclusionValidator {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        Self {
            attribute: ctx.attribute.to_string(),
            allowed: ctx.option.json().and_then(Value::as_array).cloned(),
            custom_message: ctx.option.message.clone(),
        }
    }
}

impl OptionProcessor for InclusionValidator {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        match &self.allowed {
            Some(allowed) if !allowed.is_empty() => Ok(()),
            _ => Err(TreatyError::schema(format!(
                "Option 'inclusion' for attribute '{}' must have a non-empty array of allowed values",
                self.attribute
            ))),
        }
    }

    fn validate_value(&self, value: &Value) -> Result<(), TreatyError> {
        let allowed = self.allowed.as_deref().unwrap_or_default();
        if value.is_null() || allowed.contains(value) {
            return Ok(());
        }
        Err(TreatyError::validation(self.custom_message.clone().unwrap_or_else(|| {
            format!(
                "Attribute '{}' must be one of: {}. Got: '{}'",
                self.attribute,
                allowed.iter().map(display_value).collect::<Vec<_>>().join(", "),
                display_value(value)
            )
        })))
    }
}

struct FormatValidator {
    attribute: String,
    attribute_type: AttributeType,
    declared: Option<Value>,
    format: Option<Format>,
    custom_message: Option<String>,
}

impl FormatValidator {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        let declared = ctx.option.json().cloned();
        Self {
            attribute: ctx.attribute.to_string(),
            attribute_type: ctx.attribute_type,
            format: declared.as_ref().and_then(Value::as_str).and_then(Format::parse),
            declared,
            custom_message: ctx.option.message.clone(),
        }
    }
}

impl OptionProcessor for FormatValidator {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        if self.attribute_type != AttributeType::String {
            return Err(TreatyError::schema(format!(
                "Option 'format' for attribute '{}' is only supported for string attributes, got {}",
                self.attribute, self.attribute_type
            )));
        }
        if self.format.is_none() {
            return Err(TreatyError::schema(format!(
                "Unknown format '{}' for attribute '{}'. Supported formats: {}",
                self.declared.as_ref().map_or("null".into(), display_value),
                self.attribute,
                Format::known_list()
            )));
        }
        Ok(())
    }

    fn validate_value(&self, value: &Value) -> Result<(), TreatyError> {
        let (Some(format), Value::String(raw)) = (self.format, value) else {
            return Ok(());
        };
        if format.is_valid(raw) {
            return Ok(());
        }
        Err(TreatyError::validation(self.custom_message.clone().unwrap_or_else(|| {
            format!(
                "Attribute '{}' has invalid {} format: '{}'",
                self.attribute, format, raw
            )
        })))
    }
}

// --- Modifiers ---

struct DefaultModifier {
    attribute: String,
    attribute_type: AttributeType,
    value: OptionValue,
}

impl DefaultModifier {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        Self {
            attribute: ctx.attribute.to_string(),
            attribute_type: ctx.attribute_type,
            value: ctx.option.value.clone(),
        }
    }
}

impl OptionProcessor for DefaultModifier {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        match &self.value {
            OptionValue::Json(default)
                if !default.is_null() && !self.attribute_type.matches(default) =>
            {
                Err(TreatyError::schema(format!(
                    "Default of attribute '{}' must be {} {}, got {}",
                    self.attribute,
                    article(self.attribute_type.as_str()),
                    self.attribute_type,
                    json_type_name(default)
                )))
            }
            OptionValue::Json(_) | OptionValue::Provider(_) => Ok(()),
            OptionValue::Transformer(_) => Err(TreatyError::schema(format!(
                "Option 'default' for attribute '{}' must be a value or a zero-argument provider",
                self.attribute
            ))),
        }
    }

    // Only null is replaced; empty strings, arrays and `false` survive.
    fn transform_value(&self, value: Value) -> Result<Value, TreatyError> {
        if !value.is_null() {
            return Ok(value);
        }
        Ok(match &self.value {
            OptionValue::Json(default) => default.clone(),
            OptionValue::Provider(provider) => provider(),
            OptionValue::Transformer(_) => value,
        })
    }
}

struct AsModifier {
    attribute: String,
    target: Option<String>,
}

impl AsModifier {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        Self {
            attribute: ctx.attribute.to_string(),
            target: ctx
                .option
                .json()
                .and_then(Value::as_str)
                .map(String::from),
        }
    }
}

impl OptionProcessor for AsModifier {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        match self.target.as_deref() {
            Some(target) if !target.is_empty() => Ok(()),
            _ => Err(TreatyError::schema(format!(
                "Option 'as' for attribute '{}' must be a non-empty name",
                self.attribute
            ))),
        }
    }

    fn transforms_name(&self) -> bool {
        true
    }

    fn target_name(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

struct CastModifier {
    attribute: String,
    attribute_type: AttributeType,
    declared: Option<Value>,
    target: Option<AttributeType>,
    custom_message: Option<String>,
}

impl CastModifier {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        let declared = ctx.option.json().cloned();
        Self {
            attribute: ctx.attribute.to_string(),
            attribute_type: ctx.attribute_type,
            target: declared
                .as_ref()
                .and_then(Value::as_str)
                .and_then(AttributeType::parse),
            declared,
            custom_message: ctx.option.message.clone(),
        }
    }
}

/// Conversions `cast` supports, as (from, to).
const CASTS: &[(AttributeType, AttributeType)] = &[
    (AttributeType::Integer, AttributeType::String),
    (AttributeType::String, AttributeType::Integer),
    (AttributeType::Boolean, AttributeType::String),
    (AttributeType::String, AttributeType::Boolean),
    (AttributeType::Integer, AttributeType::Boolean),
    (AttributeType::Datetime, AttributeType::String),
    (AttributeType::String, AttributeType::Datetime),
];

impl OptionProcessor for CastModifier {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        let Some(target) = self.target else {
            return Err(TreatyError::schema(format!(
                "Unknown cast target '{}' for attribute '{}'. Allowed types: {}",
                self.declared.as_ref().map_or("null".into(), display_value),
                self.attribute,
                AttributeType::known_list()
            )));
        };
        if target == self.attribute_type || CASTS.contains(&(self.attribute_type, target)) {
            Ok(())
        } else {
            Err(TreatyError::schema(format!(
                "Attribute '{}' cannot be cast from {} to {}",
                self.attribute, self.attribute_type, target
            )))
        }
    }

    fn transform_value(&self, value: Value) -> Result<Value, TreatyError> {
        let Some(target) = self.target else {
            return Ok(value);
        };
        if value.is_null() || target == self.attribute_type {
            return Ok(value);
        }
        cast(&value, target).ok_or_else(|| {
            TreatyError::validation(self.custom_message.clone().unwrap_or_else(|| {
                format!(
                    "Cannot cast attribute '{}' from {} to {}: '{}'",
                    self.attribute,
                    self.attribute_type,
                    target,
                    display_value(&value)
                )
            }))
        })
    }
}

fn cast(value: &Value, target: AttributeType) -> Option<Value> {
    match (value, target) {
        (Value::Number(n), AttributeType::String) => Some(Value::String(n.to_string())),
        (Value::Bool(b), AttributeType::String) => Some(Value::String(b.to_string())),
        (Value::String(s), AttributeType::String) => Some(Value::String(s.clone())),
        (Value::String(s), AttributeType::Integer) => {
            s.trim().parse::<i64>().ok().map(Value::from)
        }
        (Value::String(s), AttributeType::Boolean) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
            _ => None,
        },
        (Value::Number(n), AttributeType::Boolean) => n.as_i64().map(|i| Value::Bool(i != 0)),
        (Value::String(s), AttributeType::Datetime) if Format::DateTime.is_valid(s) => {
            Some(Value::String(s.clone()))
        }
        _ => None,
    }
}

struct TransformModifier {
    attribute: String,
    value: OptionValue,
    custom_message: Option<String>,
}

impl TransformModifier {
    fn new(ctx: &ProcessorContext<'_>) -> Self {
        Self {
            attribute: ctx.attribute.to_string(),
            value: ctx.option.value.clone(),
            custom_message: ctx.option.message.clone(),
        }
    }
}

impl OptionProcessor for TransformModifier {
    fn validate_schema(&self) -> Result<(), TreatyError> {
        match self.value {
            OptionValue::Transformer(_) => Ok(()),
            _ => Err(TreatyError::schema(format!(
                "Option 'transform' for attribute '{}' must be a transformer function",
                self.attribute
            ))),
        }
    }

    fn transform_value(&self, value: Value) -> Result<Value, TreatyError> {
        let OptionValue::Transformer(transformer) = &self.value else {
            return Ok(value);
        };
        if value.is_null() {
            return Ok(value);
        }
        transformer(&value).map_err(|reason| {
            TreatyError::validation(self.custom_message.clone().unwrap_or_else(|| {
                format!(
                    "Transformation failed for attribute '{}': {}",
                    self.attribute, reason
                )
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::{normalize, Options};
    use serde_json::json;

    fn build(
        name: &str,
        attribute_type: AttributeType,
        options: Options,
        option: &str,
    ) -> Box<dyn OptionProcessor> {
        let set = normalize(&options);
        let normalized = set.get(option).unwrap();
        let registry = ProcessorRegistry::with_builtins();
        let (_, factory) = registry.entries().find(|(n, _)| *n == option).unwrap();
        factory(&ProcessorContext {
            attribute: name,
            attribute_type,
            option: normalized,
        })
    }

    #[test]
    fn builtin_order() {
        let registry = ProcessorRegistry::with_builtins();
        assert_eq!(
            registry.known_names(),
            vec!["required", "type", "inclusion", "format", "default", "cast", "transform", "as"]
        );
    }

    #[test]
    fn register_custom_and_replace() {
        struct Upcase;
        impl OptionProcessor for Upcase {
            fn transform_value(&self, value: Value) -> Result<Value, TreatyError> {
                Ok(match value {
                    Value::String(s) => Value::String(s.to_uppercase()),
                    other => other,
                })
            }
        }
        let mut registry = ProcessorRegistry::with_builtins();
        registry.register_modifier("upcase", |_| Box::new(Upcase));
        assert!(registry.is_known("upcase"));
        registry.register_modifier("upcase", |_| Box::new(Upcase));
        assert_eq!(registry.modifier_names().iter().filter(|n| **n == "upcase").count(), 1);
    }

    #[test]
    fn required_rejects_null_and_empty() {
        let p = build("title", AttributeType::String, Options::new().required(), "required");
        assert!(p.validate_schema().is_ok());
        assert!(p.validate_value(&json!("x")).is_ok());
        for missing in [json!(null), json!(""), json!([])] {
            let err = p.validate_value(&missing).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Attribute 'title' is required but was not provided or is empty"
            );
        }
        assert!(p.validate_value(&json!(false)).is_ok());
        assert!(p.validate_value(&json!(0)).is_ok());
    }

    #[test]
    fn required_disabled_skips_check() {
        let p = build("title", AttributeType::String, Options::new().optional(), "required");
        assert!(p.validate_value(&json!(null)).is_ok());
        assert!(p.validate_value(&json!("")).is_ok());
    }

    #[test]
    fn required_custom_message() {
        let options = Options::new().set("required", json!({"is": true, "message": "Title!"}));
        let p = build("title", AttributeType::String, options, "required");
        assert_eq!(p.validate_value(&json!(null)).unwrap_err().to_string(), "Title!");
    }

    #[test]
    fn required_schema_rejects_non_boolean() {
        let options = Options::new().set("required", "yes");
        let p = build("title", AttributeType::String, options, "required");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
    }

    #[test]
    fn type_checks_value_and_skips_null() {
        let p = build("age", AttributeType::Integer, Options::new().set("type", "integer"), "type");
        assert!(p.validate_schema().is_ok());
        assert!(p.validate_value(&json!(3)).is_ok());
        assert!(p.validate_value(&json!(null)).is_ok());
        let err = p.validate_value(&json!("3")).unwrap_err();
        assert_eq!(err.to_string(), "Attribute 'age' must be an integer, got string");
    }

    #[test]
    fn type_schema_rejects_unknown_token() {
        let p = build("age", AttributeType::Integer, Options::new().set("type", "float"), "type");
        let err = p.validate_schema().unwrap_err();
        assert!(err.to_string().contains("Unknown type 'float'"));
    }

    #[test]
    fn inclusion_lists_allowed_and_rejected() {
        let options = Options::new().inclusion(json!(["admin", "user", "guest"]));
        let p = build("role", AttributeType::String, options, "inclusion");
        assert!(p.validate_schema().is_ok());
        assert!(p.validate_value(&json!("user")).is_ok());
        assert!(p.validate_value(&json!(null)).is_ok());
        let err = p.validate_value(&json!("root")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attribute 'role' must be one of: admin, user, guest. Got: 'root'"
        );
    }

    #[test]
    fn inclusion_schema_requires_values() {
        let options = Options::new().inclusion(json!([]));
        let p = build("role", AttributeType::String, options, "inclusion");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
        let options = Options::new().inclusion(json!("admin"));
        let p = build("role", AttributeType::String, options, "inclusion");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
    }

    #[test]
    fn format_message_names_attribute_format_and_value() {
        let p = build("email", AttributeType::String, Options::new().format("email"), "format");
        assert!(p.validate_schema().is_ok());
        assert!(p.validate_value(&json!("a@b.io")).is_ok());
        let err = p.validate_value(&json!("nope")).unwrap_err();
        assert_eq!(err.to_string(), "Attribute 'email' has invalid email format: 'nope'");
    }

    #[test]
    fn format_schema_errors() {
        let p = build("email", AttributeType::String, Options::new().format("phone"), "format");
        assert!(p.validate_schema().unwrap_err().to_string().contains("Unknown format 'phone'"));
        let p = build("count", AttributeType::Integer, Options::new().format("email"), "format");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
    }

    #[test]
    fn default_replaces_only_null() {
        let options = Options::new().default_value(json!(["x"]));
        let p = build("tags", AttributeType::Array, options, "default");
        assert_eq!(p.transform_value(json!(null)).unwrap(), json!(["x"]));
        assert_eq!(p.transform_value(json!([])).unwrap(), json!([]));

        let options = Options::new().default_value(json!("anon"));
        let p = build("name", AttributeType::String, options, "default");
        assert_eq!(p.transform_value(json!("")).unwrap(), json!(""));

        let options = Options::new().default_value(json!(true));
        let p = build("on", AttributeType::Boolean, options, "default");
        assert_eq!(p.transform_value(json!(false)).unwrap(), json!(false));
    }

    #[test]
    fn default_must_match_attribute_type() {
        let options = Options::new().default_value(json!("oops"));
        let p = build("tags", AttributeType::Array, options, "default");
        let err = p.validate_schema().unwrap_err();
        assert!(matches!(err, TreatyError::Schema { .. }));
        assert_eq!(err.to_string(), "Default of attribute 'tags' must be an array, got string");

        let options = Options::new().default_value(json!([]));
        let p = build("meta", AttributeType::Object, options, "default");
        assert!(p.validate_schema().is_err());
        let options = Options::new().default_value(json!("soon"));
        let p = build("at", AttributeType::Datetime, options, "default");
        assert!(p.validate_schema().is_err());

        let options = Options::new().default_value(json!(1));
        let p = build("page", AttributeType::Integer, options, "default");
        assert!(p.validate_schema().is_ok());
        let options = Options::new().default_value(json!(null));
        let p = build("page", AttributeType::Integer, options, "default");
        assert!(p.validate_schema().is_ok());
    }

    #[test]
    fn default_provider_is_invoked() {
        let options = Options::new().default_with(|| json!(7));
        let p = build("n", AttributeType::Integer, options, "default");
        assert_eq!(p.transform_value(json!(null)).unwrap(), json!(7));
    }

    #[test]
    fn as_renames() {
        let p = build("handle", AttributeType::String, Options::new().rename("value"), "as");
        assert!(p.validate_schema().is_ok());
        assert!(p.transforms_name());
        assert_eq!(p.target_name(), Some("value"));

        let p = build("handle", AttributeType::String, Options::new().set("as", json!(1)), "as");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
    }

    #[test]
    fn cast_converts_and_reports_failures() {
        let p = build("page", AttributeType::String, Options::new().cast("integer"), "cast");
        assert!(p.validate_schema().is_ok());
        assert_eq!(p.transform_value(json!("12")).unwrap(), json!(12));
        assert_eq!(p.transform_value(json!(null)).unwrap(), json!(null));
        let err = p.transform_value(json!("twelve")).unwrap_err();
        assert!(matches!(err, TreatyError::Validation { .. }));

        let p = build("active", AttributeType::Integer, Options::new().cast("boolean"), "cast");
        assert_eq!(p.transform_value(json!(0)).unwrap(), json!(false));
    }

    #[test]
    fn cast_schema_rejects_unsupported_conversion() {
        let p = build("meta", AttributeType::Object, Options::new().cast("integer"), "cast");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
        let p = build("n", AttributeType::String, Options::new().cast("float"), "cast");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
    }

    #[test]
    fn transform_applies_function() {
        let options = Options::new().transform(|v| match v {
            Value::String(s) => Ok(Value::String(s.trim().to_string())),
            _ => Err("not a string".into()),
        });
        let p = build("name", AttributeType::String, options, "transform");
        assert!(p.validate_schema().is_ok());
        assert_eq!(p.transform_value(json!("  x ")).unwrap(), json!("x"));
        let err = p.transform_value(json!(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Transformation failed for attribute 'name': not a string"
        );

        let options = Options::new().set("transform", "upcase");
        let p = build("name", AttributeType::String, options, "transform");
        assert!(matches!(p.validate_schema(), Err(TreatyError::Schema { .. })));
    }
}
