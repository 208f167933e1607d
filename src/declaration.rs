//! JSON declaration files.
//!
//! A declaration describes the same contract the Rust builders do:
//!
//! ```json
//! {
//!   "name": "posts#create",
//!   "config": { "max_nesting_level": 3 },
//!   "versions": [{
//!     "version": "1.0.0",
//!     "default": true,
//!     "strategy": "adapter",
//!     "request": [{ "scope": "post", "attributes": [
//!       { "type": "string", "name": "title", "helpers": ["required"] }
//!     ]}],
//!     "response": [{ "status": 201, "scopes": [{ "attributes": [
//!       { "type": "string", "name": "id" }
//!     ]}]}],
//!     "delegate_to": "posts/create"
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TreatyError;
use crate::executor::ExecutorRegistry;
use crate::option::{Helper, Options};
use crate::schema::{BlockResult, SchemaBlock, SchemaFactory};
use crate::treaty::Treaty;
use crate::types::{Config, SELF_SCOPE};
use crate::version::SemanticVersion;

fn root_scope() -> String {
    SELF_SCOPE.to_string()
}

fn unnamed() -> String {
    "treaty".to_string()
}

/// A whole declaration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreatyDeclaration {
    #[serde(default = "unnamed")]
    pub name: String,
    #[serde(default)]
    pub config: Config,
    pub versions: Vec<VersionDeclaration>,
}

/// One `versions[]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionDeclaration {
    /// String, number or array of segments.
    pub version: Value,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub request: Vec<ScopeDeclaration>,
    #[serde(default)]
    pub response: Vec<ResponseDeclaration>,
    #[serde(default)]
    pub delegate_to: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// One response block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDeclaration {
    #[serde(default)]
    pub status: Option<u16>,
    pub scopes: Vec<ScopeDeclaration>,
}

/// One scope; `scope` defaults to the root scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeDeclaration {
    #[serde(default = "root_scope")]
    pub scope: String,
    pub attributes: Vec<AttributeDeclaration>,
}

/// One attribute and its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDeclaration {
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub name: String,
    #[serde(default)]
    pub helpers: Vec<String>,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub attributes: Vec<AttributeDeclaration>,
}

impl TreatyDeclaration {
    /// Parse a declaration from an already loaded JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Build the treaty. Executors are looked up in `executors` when a
    /// request is served, not here.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` for any defect in the declaration.
    pub fn build(&self, executors: ExecutorRegistry) -> Result<Treaty, TreatyError> {
        let mut builder = Treaty::builder(self.name.clone())
            .config(self.config)
            .executors(executors);

        for declaration in &self.versions {
            let version = SemanticVersion::from_json(&declaration.version)?;
            builder = builder.version(version, |v| {
                if let Some(summary) = &declaration.summary {
                    v.summary(summary.clone());
                }
                if let Some(code) = &declaration.strategy {
                    v.strategy(code)?;
                }
                if declaration.default {
                    v.default();
                }
                v.deprecated(declaration.deprecated);

                if !declaration.request.is_empty() {
                    v.request(|request| declare_scopes(request, &declaration.request))?;
                }
                for response in &declaration.response {
                    let status = response.status.unwrap_or(self.config.default_status);
                    v.response(status, |factory| declare_scopes(factory, &response.scopes))?;
                }

                if let Some(reference) = &declaration.delegate_to {
                    v.delegate_to(reference.as_str());
                    if let Some(method) = &declaration.method {
                        v.method(method.clone());
                    }
                }
                Ok(())
            })?;
        }

        Ok(builder.build())
    }
}

fn declare_scopes(factory: &mut SchemaFactory, scopes: &[ScopeDeclaration]) -> BlockResult {
    for scope in scopes {
        factory.scope(&scope.scope, |block| declare_attributes(block, &scope.attributes))?;
    }
    Ok(())
}

fn declare_attributes(block: &mut SchemaBlock, attributes: &[AttributeDeclaration]) -> BlockResult {
    for attribute in attributes {
        let options = attribute.helpers.iter().try_fold(
            Options::from_json(&attribute.options),
            |options, token| {
                Helper::parse(token).map(|helper| options.helper(helper)).ok_or_else(|| {
                    TreatyError::schema(format!(
                        "Unknown helper '{}' for attribute '{}'. Known helpers: required, optional",
                        token, attribute.name
                    ))
                })
            },
        )?;
        block.declare(&attribute.attribute_type, &attribute.name, options, |nested| {
            declare_attributes(nested, &attribute.attributes)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;
    use serde_json::json;

    fn declaration(value: Value) -> TreatyDeclaration {
        TreatyDeclaration::from_value(value).unwrap()
    }

    #[test]
    fn builds_versions_and_scopes() {
        let treaty = declaration(json!({
            "name": "posts#create",
            "versions": [{
                "version": [1, 0],
                "default": true,
                "strategy": "direct",
                "summary": "Create",
                "request": [
                    {"scope": "post", "attributes": [
                        {"type": "string", "name": "title", "helpers": ["required"]},
                        {"type": "array", "name": "tags", "attributes": [
                            {"type": "string", "name": "_self"}
                        ]}
                    ]},
                    {"attributes": [{"type": "integer", "name": "page", "helpers": ["optional"]}]}
                ],
                "response": [{"status": 201, "scopes": [{"attributes": [
                    {"type": "string", "name": "id"}
                ]}]}],
                "delegate_to": "posts/create",
                "method": "perform"
            }]
        }))
        .build(ExecutorRegistry::new())
        .unwrap();

        assert_eq!(treaty.name(), "posts#create");
        let factory = treaty.resolve(None).unwrap();
        assert_eq!(factory.version().to_string(), "1.0");
        assert_eq!(factory.strategy(), Strategy::Direct);
        assert_eq!(factory.summary(), Some("Create"));
        assert_eq!(factory.request().unwrap().scopes().len(), 2);
        assert_eq!(factory.response().unwrap().status(), 201);
        assert_eq!(factory.executor().unwrap().method(), "perform");
    }

    #[test]
    fn explicit_option_beats_helper() {
        let treaty = declaration(json!({"versions": [{
            "version": "1",
            "default": true,
            "request": [{"attributes": [
                {"type": "string", "name": "nick", "helpers": ["required"], "options": {"required": false}}
            ]}]
        }]}))
        .build(ExecutorRegistry::new())
        .unwrap();
        let request = treaty.resolve(None).unwrap().request().unwrap();
        assert!(!request.scopes()[0].attributes()[0].is_required());
    }

    #[test]
    fn unknown_helper_is_schema_error() {
        let err = declaration(json!({"versions": [{
            "version": "1",
            "request": [{"attributes": [{"type": "string", "name": "a", "helpers": ["mandatory"]}]}]
        }]}))
        .build(ExecutorRegistry::new())
        .unwrap_err();
        assert!(err.to_string().contains("Unknown helper 'mandatory'"));
    }

    #[test]
    fn unknown_option_is_schema_error() {
        let err = declaration(json!({"versions": [{
            "version": "1",
            "request": [{"attributes": [{"type": "string", "name": "a", "options": {"min": 1}}]}]
        }]}))
        .build(ExecutorRegistry::new())
        .unwrap_err();
        assert!(err.to_string().contains("Unknown options for attribute 'a': min"));
    }

    #[test]
    fn config_is_applied() {
        let err = declaration(json!({
            "config": {"max_nesting_level": 0},
            "versions": [{
                "version": "1",
                "request": [{"attributes": [
                    {"type": "object", "name": "a", "attributes": [{"type": "string", "name": "b"}]}
                ]}]
            }]
        }))
        .build(ExecutorRegistry::new())
        .unwrap_err();
        assert!(err.to_string().contains("Maximum allowed nesting level is 0"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = TreatyDeclaration::from_value(json!({"versions": [], "extra": 1}));
        assert!(result.is_err());
    }
}
