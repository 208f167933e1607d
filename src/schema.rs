//! Declaring request and response schemas.
//!
//! A [`SchemaBlock`] collects attributes through type-named methods
//! (`string`, `object`, ...) or the token-keyed [`SchemaBlock::declare`].
//! Blocks live in named [`Scope`]s, and scopes make up a [`SchemaFactory`].

use std::fmt;
use std::sync::Arc;

use crate::attribute::{Attribute, AttributeSpec};
use crate::error::TreatyError;
use crate::option::Options;
use crate::processor::ProcessorRegistry;
use crate::types::{AttributeType, Config, Flavor, SELF_SCOPE};

/// Body of a nested declaration.
pub type BlockResult = Result<(), TreatyError>;

/// Builder for the attributes of one scope or one nested attribute.
pub struct SchemaBlock {
    flavor: Flavor,
    nesting_level: usize,
    max_nesting_level: usize,
    registry: Arc<ProcessorRegistry>,
    attributes: Vec<Attribute>,
}

impl fmt::Debug for SchemaBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBlock")
            .field("flavor", &self.flavor)
            .field("nesting_level", &self.nesting_level)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl SchemaBlock {
    pub fn new(flavor: Flavor, max_nesting_level: usize, registry: Arc<ProcessorRegistry>) -> Self {
        Self {
            flavor,
            nesting_level: 0,
            max_nesting_level,
            registry,
            attributes: Vec::new(),
        }
    }

    fn child(&self, flavor: Flavor, nesting_level: usize) -> Self {
        Self {
            flavor,
            nesting_level,
            max_nesting_level: self.max_nesting_level,
            registry: Arc::clone(&self.registry),
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute by type token, running `nested` for its children.
    ///
    /// # Errors
    ///
    /// Returns `TreatyError::Schema` for unknown type tokens and for any
    /// defect of the attribute or its children.
    pub fn declare<F>(
        &mut self,
        token: &str,
        name: &str,
        options: Options,
        nested: F,
    ) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaBlock) -> BlockResult,
    {
        let attribute_type = AttributeType::parse(token).ok_or_else(|| {
            TreatyError::schema(format!(
                "Unknown type '{}' for attribute '{}'. Allowed types: {}",
                token,
                name,
                AttributeType::known_list()
            ))
        })?;
        self.attribute(name, attribute_type, options, nested)
    }

    /// Declare an attribute of a given type.
    pub fn attribute<F>(
        &mut self,
        name: &str,
        attribute_type: AttributeType,
        options: Options,
        nested: F,
    ) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaBlock) -> BlockResult,
    {
        let mut children = self.child(self.flavor, self.nesting_level + 1);
        nested(&mut children)?;

        let attribute = Attribute::new(
            AttributeSpec {
                name,
                attribute_type,
                options: &options,
                flavor: self.flavor,
                nesting_level: self.nesting_level,
                children: children.attributes,
            },
            self.max_nesting_level,
            &self.registry,
        )?;
        self.attributes.push(attribute);
        Ok(self)
    }

    pub fn string(&mut self, name: &str, options: Options) -> Result<&mut Self, TreatyError> {
        self.attribute(name, AttributeType::String, options, |_| Ok(()))
    }

    pub fn integer(&mut self, name: &str, options: Options) -> Result<&mut Self, TreatyError> {
        self.attribute(name, AttributeType::Integer, options, |_| Ok(()))
    }

    pub fn boolean(&mut self, name: &str, options: Options) -> Result<&mut Self, TreatyError> {
        self.attribute(name, AttributeType::Boolean, options, |_| Ok(()))
    }

    pub fn datetime(&mut self, name: &str, options: Options) -> Result<&mut Self, TreatyError> {
        self.attribute(name, AttributeType::Datetime, options, |_| Ok(()))
    }

    pub fn object<F>(
        &mut self,
        name: &str,
        options: Options,
        nested: F,
    ) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaBlock) -> BlockResult,
    {
        self.attribute(name, AttributeType::Object, options, nested)
    }

    pub fn array<F>(
        &mut self,
        name: &str,
        options: Options,
        nested: F,
    ) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaBlock) -> BlockResult,
    {
        self.attribute(name, AttributeType::Array, options, nested)
    }

    /// Splice an entity's attributes into this block.
    ///
    /// Entity attributes keep the entity flavor (required by default).
    pub fn entity(&mut self, entity: &Entity) -> Result<&mut Self, TreatyError> {
        let mut block = self.child(Flavor::Entity, self.nesting_level);
        (entity.body)(&mut block)?;
        self.attributes.extend(block.attributes);
        Ok(self)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn into_attributes(self) -> Vec<Attribute> {
        self.attributes
    }
}

/// A reusable attribute block, declared once and spliced into schemas.
#[derive(Clone)]
pub struct Entity {
    name: String,
    body: Arc<dyn Fn(&mut SchemaBlock) -> BlockResult + Send + Sync>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("name", &self.name).finish()
    }
}

impl Entity {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&mut SchemaBlock) -> BlockResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named top-level region of a request or response.
#[derive(Debug)]
pub struct Scope {
    name: String,
    attributes: Vec<Attribute>,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Root scopes splice their output into the result instead of nesting it.
    pub fn is_root(&self) -> bool {
        self.name == SELF_SCOPE
    }
}

/// All scopes of a request or of a response, merged by scope name.
#[derive(Debug)]
pub struct SchemaFactory {
    flavor: Flavor,
    status: u16,
    scopes: Vec<Scope>,
    max_nesting_level: usize,
    registry: Arc<ProcessorRegistry>,
}

impl SchemaFactory {
    pub fn new(flavor: Flavor, config: &Config, registry: Arc<ProcessorRegistry>) -> Self {
        Self {
            flavor,
            status: config.default_status,
            scopes: Vec::new(),
            max_nesting_level: config.max_nesting_level,
            registry,
        }
    }

    /// Declare attributes under a named scope. Repeated scopes are merged.
    pub fn scope<F>(&mut self, name: &str, body: F) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaBlock) -> BlockResult,
    {
        let mut block =
            SchemaBlock::new(self.flavor, self.max_nesting_level, Arc::clone(&self.registry));
        body(&mut block)?;
        let attributes = block.into_attributes();

        match self.scopes.iter_mut().find(|s| s.name == name) {
            Some(scope) => scope.attributes.extend(attributes),
            None => self.scopes.push(Scope {
                name: name.to_string(),
                attributes,
            }),
        }
        Ok(self)
    }

    /// Declare attributes at the root of the data.
    pub fn root<F>(&mut self, body: F) -> Result<&mut Self, TreatyError>
    where
        F: FnOnce(&mut SchemaBlock) -> BlockResult,
    {
        self.scope(SELF_SCOPE, body)
    }

    pub fn set_status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn find_scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
