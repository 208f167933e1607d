//! Attribute schema nodes.

use serde_json::{json, Value};

use crate::error::TreatyError;
use crate::option::{normalize, OptionSet, Options};
use crate::processor::ProcessorRegistry;
use crate::types::{AttributeType, Flavor, SELF_SCOPE};
use crate::validator::AttributeValidator;

/// A typed, named node of a request, response or entity schema.
///
/// Attributes are validated when built and never change afterwards.
#[derive(Debug)]
pub struct Attribute {
    name: String,
    attribute_type: AttributeType,
    nesting_level: usize,
    flavor: Flavor,
    options: OptionSet,
    children: Vec<Attribute>,
    validator: AttributeValidator,
}

/// Everything needed to build one attribute.
#[derive(Debug)]
pub struct AttributeSpec<'a> {
    pub name: &'a str,
    pub attribute_type: AttributeType,
    pub options: &'a Options,
    pub flavor: Flavor,
    pub nesting_level: usize,
    pub children: Vec<Attribute>,
}

impl Attribute {
    /// Build and schema-check an attribute.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` when the nesting level exceeds
    /// `max_nesting_level`, when children are declared on a scalar type, or
    /// when any option is unknown or malformed.
    pub fn new(
        spec: AttributeSpec<'_>,
        max_nesting_level: usize,
        registry: &ProcessorRegistry,
    ) -> Result<Self, TreatyError> {
        let AttributeSpec {
            name,
            attribute_type,
            options,
            flavor,
            nesting_level,
            children,
        } = spec;

        if nesting_level > max_nesting_level {
            return Err(TreatyError::schema(format!(
                "Cannot define attribute '{}' at nesting level {}. Maximum allowed nesting level is {}",
                name, nesting_level, max_nesting_level
            )));
        }

        if !children.is_empty() && !attribute_type.is_container() {
            return Err(TreatyError::schema(format!(
                "Attribute '{}' of type {} cannot have nested attributes",
                name, attribute_type
            )));
        }

        if children.iter().any(|c| c.name == SELF_SCOPE) && children.len() > 1 {
            return Err(TreatyError::schema(format!(
                "Attribute '{}' mixes '{}' with named attributes; '{}' must be the only child",
                name, SELF_SCOPE, SELF_SCOPE
            )));
        }

        if attribute_type == AttributeType::Object && children.iter().any(|c| c.name == SELF_SCOPE)
        {
            return Err(TreatyError::schema(format!(
                "Attribute '{}' is an object; '{}' is only allowed inside arrays",
                name, SELF_SCOPE
            )));
        }

        let mut options = normalize(options);
        options.insert_if_absent("required", json!(flavor.required_by_default()));
        options.insert_if_absent("type", json!(attribute_type.as_str()));

        let validator = AttributeValidator::new(name, attribute_type, &options, registry);
        validator.validate_schema()?;

        Ok(Self {
            name: name.to_string(),
            attribute_type,
            nesting_level,
            flavor,
            options,
            children,
            validator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn children(&self) -> &[Attribute] {
        &self.children
    }

    pub fn validator(&self) -> &AttributeValidator {
        &self.validator
    }

    /// Container with declared children.
    pub fn is_nested(&self) -> bool {
        self.attribute_type.is_container() && !self.children.is_empty()
    }

    /// Element attribute of an array of scalars (`array :tags { string :_self }`).
    pub fn self_element(&self) -> Option<&Attribute> {
        match (self.attribute_type, self.children.as_slice()) {
            (AttributeType::Array, [only]) if only.name == SELF_SCOPE => Some(only),
            _ => None,
        }
    }

    /// Whether the `required` option is in effect.
    pub fn is_required(&self) -> bool {
        self.options
            .get("required")
            .and_then(|o| o.json())
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Key under which the attribute appears in output.
    pub fn output_name(&self) -> &str {
        self.validator.target_name().unwrap_or(&self.name)
    }
}
