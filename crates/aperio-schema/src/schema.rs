//! # Schema Model — Describing One Typed Value
//!
//! A [`Schema`] describes a typed value: a scalar kind, an array of a
//! nested schema, an object with named properties, or a by-name
//! reference into the definitions registry. Schemas are immutable once
//! built; construction goes through [`SchemaBuilder`], a by-value
//! builder whose `build()` validates structural consistency (items only
//! on arrays, properties only on objects, and so on).
//!
//! Schemas may reference each other by name, including mutually and
//! self-recursively — a tree node schema can reference itself. Cycles
//! are only a problem when a concrete value tree is built, where the
//! wrap recursion guard reports them.

use indexmap::IndexMap;
use serde_json::Value;

use aperio_core::{DefinitionError, Existence};

use crate::registry::Definitions;
use crate::validators::{Validator, ValidatorKind};

/// The kind of value a schema describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// A boolean scalar.
    Boolean,
    /// An integer scalar.
    Integer,
    /// A floating-point scalar.
    Number,
    /// A string scalar.
    String,
    /// An array of a nested item schema.
    Array,
    /// An object with named properties.
    Object,
    /// A by-name reference to another registered schema.
    Reference(String),
}

impl SchemaKind {
    /// The document identifier for this kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Reference(_) => "reference",
        }
    }

    /// The primitive kind, if this is not a reference.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Boolean => Some(PrimitiveKind::Boolean),
            Self::Integer => Some(PrimitiveKind::Integer),
            Self::Number => Some(PrimitiveKind::Number),
            Self::String => Some(PrimitiveKind::String),
            Self::Array => Some(PrimitiveKind::Array),
            Self::Object => Some(PrimitiveKind::Object),
            Self::Reference(_) => None,
        }
    }
}

/// The non-reference kinds, used to key coercion defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Boolean scalars.
    Boolean,
    /// Integer scalars.
    Integer,
    /// Floating-point scalars.
    Number,
    /// String scalars.
    String,
    /// Arrays.
    Array,
    /// Objects.
    Object,
}

/// Policy for object properties not named in `properties`.
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    /// Undeclared properties pass through unvalidated.
    #[default]
    Allow,
    /// Undeclared properties are violations.
    Deny,
    /// Undeclared properties are validated against this schema.
    Schema(Box<Schema>),
}

/// Selects a concrete variant schema for a polymorphic object family.
#[derive(Debug, Clone)]
pub struct Discriminator {
    /// The property whose value selects the variant.
    pub property_name: String,
    /// Discriminator value → registered variant schema name.
    pub mapping: IndexMap<String, String>,
}

/// An immutable description of one typed value.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: SchemaKind,
    existence: Existence,
    validators: IndexMap<ValidatorKind, Validator>,
    items: Option<Box<Schema>>,
    properties: IndexMap<String, Schema>,
    additional_properties: AdditionalProperties,
    discriminator: Option<Discriminator>,
    example: Option<Value>,
    description: Option<String>,
    deprecated: bool,
    extensions: IndexMap<String, Value>,
}

impl Schema {
    /// Start building a schema of the given kind.
    pub fn builder(kind: SchemaKind) -> SchemaBuilder {
        SchemaBuilder::new(kind)
    }

    /// A by-name reference schema.
    pub fn reference(name: impl Into<String>) -> Schema {
        Schema {
            kind: SchemaKind::Reference(name.into()),
            existence: Existence::default(),
            validators: IndexMap::new(),
            items: None,
            properties: IndexMap::new(),
            additional_properties: AdditionalProperties::default(),
            discriminator: None,
            example: None,
            description: None,
            deprecated: false,
            extensions: IndexMap::new(),
        }
    }

    /// The schema kind.
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// The existence policy.
    pub fn existence(&self) -> Existence {
        self.existence
    }

    /// The validators, keyed by kind, in declaration order.
    pub fn validators(&self) -> &IndexMap<ValidatorKind, Validator> {
        &self.validators
    }

    /// The item schema, for array kinds.
    pub fn items(&self) -> Option<&Schema> {
        self.items.as_deref()
    }

    /// Named properties, for object kinds, in declaration order.
    pub fn properties(&self) -> &IndexMap<String, Schema> {
        &self.properties
    }

    /// Policy for undeclared object properties.
    pub fn additional_properties(&self) -> &AdditionalProperties {
        &self.additional_properties
    }

    /// The discriminator, for polymorphic object families.
    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    /// The example value, if declared.
    pub fn example(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    /// The description, if declared.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the schema is marked deprecated.
    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    /// Vendor extension pairs, merged last into projected documents.
    pub fn extensions(&self) -> &IndexMap<String, Value> {
        &self.extensions
    }

    /// Follow at most one reference indirection through the registry.
    ///
    /// Non-reference schemas resolve to themselves. Wrapping follows
    /// chains lazily with a recursion guard, so mutually recursive
    /// definitions are legal.
    pub fn resolve<'a>(&'a self, defs: &'a Definitions) -> Result<&'a Schema, DefinitionError> {
        match &self.kind {
            SchemaKind::Reference(name) => defs.schema(name),
            _ => Ok(self),
        }
    }
}

/// By-value builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    kind: SchemaKind,
    existence: Existence,
    validators: IndexMap<ValidatorKind, Validator>,
    items: Option<Box<Schema>>,
    properties: IndexMap<String, Schema>,
    additional_properties: AdditionalProperties,
    discriminator: Option<Discriminator>,
    example: Option<Value>,
    description: Option<String>,
    deprecated: bool,
    extensions: IndexMap<String, Value>,
}

impl SchemaBuilder {
    /// Start a builder for the given kind. Existence defaults to
    /// `Present` (required, not null, not empty).
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            existence: Existence::default(),
            validators: IndexMap::new(),
            items: None,
            properties: IndexMap::new(),
            additional_properties: AdditionalProperties::default(),
            discriminator: None,
            example: None,
            description: None,
            deprecated: false,
            extensions: IndexMap::new(),
        }
    }

    /// Set the existence policy.
    pub fn existence(mut self, existence: Existence) -> Self {
        self.existence = existence;
        self
    }

    /// Register a validator. The latest registration per kind wins and
    /// takes the latest declaration position.
    pub fn validator(mut self, validator: Validator) -> Self {
        let kind = validator.kind();
        self.validators.shift_remove(&kind);
        self.validators.insert(kind, validator);
        self
    }

    /// Add a named property (object kinds).
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Set the item schema (array kinds).
    pub fn items(mut self, schema: Schema) -> Self {
        self.items = Some(Box::new(schema));
        self
    }

    /// Set the policy for undeclared object properties.
    pub fn additional_properties(mut self, policy: AdditionalProperties) -> Self {
        self.additional_properties = policy;
        self
    }

    /// Declare a discriminator for a polymorphic object family.
    pub fn discriminator(
        mut self,
        property_name: impl Into<String>,
        mapping: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.discriminator = Some(Discriminator {
            property_name: property_name.into(),
            mapping: mapping.into_iter().collect(),
        });
        self
    }

    /// Set the example value.
    pub fn example(mut self, value: Value) -> Self {
        self.example = Some(value);
        self
    }

    /// Set the description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Mark the schema deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Attach a vendor extension pair (merged last at projection).
    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Validate structural consistency and produce the immutable schema.
    pub fn build(self) -> Result<Schema, DefinitionError> {
        if self.items.is_some() && self.kind != SchemaKind::Array {
            return Err(DefinitionError::InvalidArgument {
                reason: format!("items declared on non-array schema kind {}", self.kind.name()),
            });
        }
        if !self.properties.is_empty() && self.kind != SchemaKind::Object {
            return Err(DefinitionError::InvalidArgument {
                reason: format!(
                    "properties declared on non-object schema kind {}",
                    self.kind.name()
                ),
            });
        }
        if self.discriminator.is_some() && self.kind != SchemaKind::Object {
            return Err(DefinitionError::InvalidArgument {
                reason: format!(
                    "discriminator declared on non-object schema kind {}",
                    self.kind.name()
                ),
            });
        }
        Ok(Schema {
            kind: self.kind,
            existence: self.existence,
            validators: self.validators,
            items: self.items,
            properties: self.properties,
            additional_properties: self.additional_properties,
            discriminator: self.discriminator,
            example: self.example,
            description: self.description,
            deprecated: self.deprecated,
            extensions: self.extensions,
        })
    }
}
