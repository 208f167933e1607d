//! Per-attribute option orchestration.

use serde_json::Value;

use crate::error::TreatyError;
use crate::option::OptionSet;
use crate::processor::{OptionProcessor, ProcessorContext, ProcessorRegistry};
use crate::types::AttributeType;

/// Options checked on a nested attribute before descending into it.
const STRUCTURAL: &[&str] = &["required", "type"];

/// The processors of one attribute, in registry order.
pub struct AttributeValidator {
    attribute: String,
    processors: Vec<(String, Box<dyn OptionProcessor>)>,
    unknown: Vec<String>,
    known: Vec<String>,
}

impl std::fmt::Debug for AttributeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeValidator")
            .field("attribute", &self.attribute)
            .field(
                "processors",
                &self.processors.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("unknown", &self.unknown)
            .finish()
    }
}

impl AttributeValidator {
    /// Build one processor per declared option. `options` must already carry
    /// the `type` entry so every attribute gets a type processor.
    pub fn new(
        attribute: &str,
        attribute_type: AttributeType,
        options: &OptionSet,
        registry: &ProcessorRegistry,
    ) -> Self {
        let processors = registry
            .entries()
            .filter_map(|(name, factory)| {
                let option = options.get(name)?;
                let ctx = ProcessorContext {
                    attribute,
                    attribute_type,
                    option,
                };
                Some((name.to_string(), factory(&ctx)))
            })
            .collect();

        let unknown = options
            .names()
            .filter(|name| !registry.is_known(name))
            .map(String::from)
            .collect();

        Self {
            attribute: attribute.to_string(),
            processors,
            unknown,
            known: registry.known_names().into_iter().map(String::from).collect(),
        }
    }

    /// Phase 1 on every processor, after rejecting unknown options.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` on the first structural defect.
    pub fn validate_schema(&self) -> Result<(), TreatyError> {
        if !self.unknown.is_empty() {
            return Err(TreatyError::schema(format!(
                "Unknown options for attribute '{}': {}. Known options: {}",
                self.attribute,
                self.unknown.join(", "),
                self.known.join(", ")
            )));
        }
        self.processors
            .iter()
            .try_for_each(|(_, processor)| processor.validate_schema())
    }

    /// Phase 2 on every processor.
    pub fn validate_value(&self, value: &Value) -> Result<(), TreatyError> {
        self.processors
            .iter()
            .try_for_each(|(_, processor)| processor.validate_value(value))
    }

    /// Phase 2 restricted to the type and required checks.
    pub fn validate_structure(&self, value: &Value) -> Result<(), TreatyError> {
        self.processors
            .iter()
            .filter(|(name, _)| STRUCTURAL.contains(&name.as_str()))
            .try_for_each(|(_, processor)| processor.validate_value(value))
    }

    /// Phase 3 folded across processors in order.
    pub fn transform_value(&self, value: Value) -> Result<Value, TreatyError> {
        self.processors
            .iter()
            .try_fold(value, |value, (_, processor)| processor.transform_value(value))
    }

    pub fn transforms_name(&self) -> bool {
        self.processors.iter().any(|(_, p)| p.transforms_name())
    }

    pub fn target_name(&self) -> Option<&str> {
        self.processors
            .iter()
            .find(|(_, p)| p.transforms_name())
            .and_then(|(_, p)| p.target_name())
    }

    pub fn processor_names(&self) -> impl Iterator<Item = &str> {
        self.processors.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::{normalize, Options};
    use serde_json::json;

    fn validator(attribute_type: AttributeType, options: Options) -> AttributeValidator {
        let mut set = normalize(&options);
        set.insert_if_absent("type", json!(attribute_type.as_str()));
        AttributeValidator::new("field", attribute_type, &set, &ProcessorRegistry::with_builtins())
    }

    #[test]
    fn type_processor_is_always_present() {
        let v = validator(AttributeType::String, Options::new());
        assert_eq!(v.processor_names().collect::<Vec<_>>(), vec!["type"]);
    }

    #[test]
    fn processors_follow_registry_order() {
        let options = Options::new()
            .rename("renamed")
            .default_value(json!("x"))
            .required();
        let v = validator(AttributeType::String, options);
        assert_eq!(
            v.processor_names().collect::<Vec<_>>(),
            vec!["required", "type", "default", "as"]
        );
    }

    #[test]
    fn unknown_options_fail_schema_validation() {
        let options = Options::new().set("minimum", json!(1)).set("pattern", "x");
        let err = validator(AttributeType::Integer, options)
            .validate_schema()
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, TreatyError::Schema { .. }));
        assert!(message.contains("Unknown options for attribute 'field': minimum, pattern"));
        assert!(message.contains("Known options: required, type, inclusion"));
    }

    #[test]
    fn transform_folds_default_then_as() {
        let options = Options::new().default_value(json!("fallback")).rename("value");
        let v = validator(AttributeType::String, options);
        assert!(v.validate_schema().is_ok());
        assert_eq!(v.transform_value(json!(null)).unwrap(), json!("fallback"));
        assert!(v.transforms_name());
        assert_eq!(v.target_name(), Some("value"));
    }

    #[test]
    fn structure_check_skips_inclusion() {
        let options = Options::new().required().inclusion(json!([["a"]]));
        let v = validator(AttributeType::Array, options);
        assert!(v.validate_structure(&json!(["b"])).is_ok());
        assert!(v.validate_value(&json!(["b"])).is_err());
        assert!(v.validate_structure(&json!(null)).is_err());
        assert!(v.validate_structure(&json!("b")).is_err());
    }

    #[test]
    fn optional_null_never_fails() {
        let options = Options::new()
            .optional()
            .inclusion(json!(["a"]))
            .format("email");
        let v = validator(AttributeType::String, options);
        assert!(v.validate_value(&json!(null)).is_ok());
    }

    #[test]
    fn no_rename_without_as() {
        let v = validator(AttributeType::String, Options::new());
        assert!(!v.transforms_name());
        assert_eq!(v.target_name(), None);
    }
}
