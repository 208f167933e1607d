//! Scope orchestration - validates and transforms data against a schema factory.

use serde_json::{Map, Value};
use tracing::debug;

use crate::attribute::Attribute;
use crate::error::TreatyError;
use crate::schema::{SchemaFactory, Scope};
use crate::types::{json_type_name, AttributeType, Direction};

/// Walks every scope of a request or response schema over one payload.
///
/// Processing is fail-fast: the first violation aborts the pass and no
/// partial output is returned.
#[derive(Debug, Clone, Copy)]
pub struct ScopeOrchestrator<'a> {
    direction: Direction,
    factory: &'a SchemaFactory,
}

impl<'a> ScopeOrchestrator<'a> {
    pub fn request(factory: &'a SchemaFactory) -> Self {
        Self {
            direction: Direction::Request,
            factory,
        }
    }

    pub fn response(factory: &'a SchemaFactory) -> Self {
        Self {
            direction: Direction::Response,
            factory,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Validate and transform `data`, returning the output mapping.
    ///
    /// Root (`_self`) scopes read from and write to the top level; other
    /// scopes read `data[scope]` and nest their output under the scope name.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Validation` on the first violated constraint.
    pub fn process(&self, data: &Value) -> Result<Value, TreatyError> {
        let mut result = Map::new();

        for scope in self.factory.scopes() {
            debug!(
                direction = self.direction.label(),
                scope = scope.name(),
                attributes = scope.attributes().len(),
                "processing scope"
            );
            let output = self.process_scope(scope, data)?;
            if scope.is_root() {
                result.extend(output);
            } else {
                result.insert(scope.name().to_string(), Value::Object(output));
            }
        }

        Ok(Value::Object(result))
    }

    fn process_scope(
        &self,
        scope: &Scope,
        data: &Value,
    ) -> Result<Map<String, Value>, TreatyError> {
        let slice = if scope.is_root() {
            data
        } else {
            data.get(scope.name()).unwrap_or(&Value::Null)
        };

        let empty = Map::new();
        let fields = match slice {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                let label = if scope.is_root() {
                    format!("{} data", self.direction.label())
                } else {
                    format!("scope '{}'", scope.name())
                };
                return Err(TreatyError::validation(format!(
                    "Expected {} to be an object, got {}",
                    label,
                    json_type_name(other)
                )));
            }
        };

        process_attributes(scope.attributes(), fields)
    }
}

fn process_attributes(
    attributes: &[Attribute],
    fields: &Map<String, Value>,
) -> Result<Map<String, Value>, TreatyError> {
    let mut output = Map::new();
    for attribute in attributes {
        let value = fields.get(attribute.name()).cloned().unwrap_or(Value::Null);
        let transformed = process_attribute(attribute, value)?;
        output.insert(attribute.output_name().to_string(), transformed);
    }
    Ok(output)
}

fn process_attribute(attribute: &Attribute, value: Value) -> Result<Value, TreatyError> {
    let validator = attribute.validator();

    if !attribute.is_nested() {
        validator.validate_value(&value)?;
        return validator.transform_value(value);
    }

    // Containers only get structural checks; a null container may still take its default.
    validator.validate_structure(&value)?;
    let value = if value.is_null() {
        let value = validator.transform_value(value)?;
        validator.validate_structure(&value)?;
        value
    } else {
        value
    };

    match attribute.attribute_type() {
        AttributeType::Array => process_array(attribute, value),
        _ => {
            let empty = Map::new();
            let fields = value.as_object().unwrap_or(&empty);
            process_attributes(attribute.children(), fields).map(Value::Object)
        }
    }
}

fn process_array(attribute: &Attribute, value: Value) -> Result<Value, TreatyError> {
    let Value::Array(items) = value else {
        return Ok(Value::Array(Vec::new()));
    };

    let mut output = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let context = format!("Error in array '{}' at index {}", attribute.name(), index);
        let processed = match attribute.self_element() {
            Some(element) => process_attribute(element, item),
            None => process_element_object(attribute, item),
        };
        output.push(processed.map_err(|err| err.with_context(&context))?);
    }
    Ok(Value::Array(output))
}

fn process_element_object(attribute: &Attribute, item: Value) -> Result<Value, TreatyError> {
    match &item {
        Value::Object(fields) => {
            process_attributes(attribute.children(), fields).map(Value::Object)
        }
        other => Err(TreatyError::validation(format!(
            "Expected an object, got {}",
            json_type_name(other)
        ))),
    }
}
