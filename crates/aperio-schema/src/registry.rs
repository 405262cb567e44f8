//! # Definitions Registry — One Namespace, Built Then Frozen
//!
//! A [`Definitions`] registry owns every named entity of one API
//! definition set. It is built incrementally during application startup
//! and frozen once for the process lifetime; afterwards every lookup is
//! read-only, so a frozen registry is safe for unsynchronized
//! concurrent reads from any number of request-handling threads.
//!
//! Re-adding a name while the registry is open replaces the prior
//! entry. Any add after freezing fails with a frozen-modification
//! error and leaves the registry unchanged. Freezing verifies
//! discriminator mappings: every mapped variant must be registered, and
//! no variant may be mapped from two discriminator values.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use aperio_core::DefinitionError;

use crate::entity::{
    ExampleObject, Operation, Parameter, RequestBody, Response, SecurityScheme, Server,
};
use crate::schema::{PrimitiveKind, Schema};

/// Whether a value is being handled within a request or a response.
///
/// Existence defaults and coercion defaults are context-sensitive: an
/// absent array may default to empty within requests but not within
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
    /// Inbound request handling.
    Request,
    /// Outbound response handling.
    Response,
}

/// Per-primitive-kind stand-in values for absent input, split by usage.
#[derive(Debug, Clone, Default)]
struct Defaults {
    within_requests: HashMap<PrimitiveKind, Value>,
    within_responses: HashMap<PrimitiveKind, Value>,
}

/// The process-scoped namespace of one API definition set.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    schemas: IndexMap<String, Schema>,
    parameters: IndexMap<String, Parameter>,
    request_bodies: IndexMap<String, RequestBody>,
    responses: IndexMap<String, Response>,
    examples: IndexMap<String, ExampleObject>,
    security_schemes: IndexMap<String, SecurityScheme>,
    operations: IndexMap<String, Operation>,
    servers: Vec<Server>,
    defaults: Defaults,
    frozen: bool,
}

impl Definitions {
    /// An empty, open registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Adds (open phase) ───────────────────────────────────────────

    /// Register a schema under a name, replacing any prior entry.
    pub fn add_schema(
        &mut self,
        name: impl Into<String>,
        schema: Schema,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.schemas.insert(name.into(), schema);
        Ok(())
    }

    /// Register a parameter under a name.
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        parameter: Parameter,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.parameters.insert(name.into(), parameter);
        Ok(())
    }

    /// Register a request body under a name.
    pub fn add_request_body(
        &mut self,
        name: impl Into<String>,
        body: RequestBody,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.request_bodies.insert(name.into(), body);
        Ok(())
    }

    /// Register a response under a name.
    pub fn add_response(
        &mut self,
        name: impl Into<String>,
        response: Response,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.responses.insert(name.into(), response);
        Ok(())
    }

    /// Register an example under a name.
    pub fn add_example(
        &mut self,
        name: impl Into<String>,
        example: ExampleObject,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.examples.insert(name.into(), example);
        Ok(())
    }

    /// Register a security scheme under a name.
    pub fn add_security_scheme(
        &mut self,
        name: impl Into<String>,
        scheme: SecurityScheme,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.security_schemes.insert(name.into(), scheme);
        Ok(())
    }

    /// Register an operation under a name.
    pub fn add_operation(
        &mut self,
        name: impl Into<String>,
        operation: Operation,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.operations.insert(name.into(), operation);
        Ok(())
    }

    /// Add a document-level server.
    pub fn add_server(&mut self, server: Server) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.servers.push(server);
        Ok(())
    }

    /// Declare the stand-in value for an absent value of the given
    /// primitive kind in the given usage context.
    pub fn add_default(
        &mut self,
        kind: PrimitiveKind,
        usage: Usage,
        value: Value,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        match usage {
            Usage::Request => self.defaults.within_requests.insert(kind, value),
            Usage::Response => self.defaults.within_responses.insert(kind, value),
        };
        Ok(())
    }

    // ─── Lookups ─────────────────────────────────────────────────────

    /// Resolve a registered schema by name.
    pub fn schema(&self, name: &str) -> Result<&Schema, DefinitionError> {
        self.schemas
            .get(name)
            .ok_or_else(|| unknown("schema", name))
    }

    /// Resolve a registered parameter by name.
    pub fn parameter(&self, name: &str) -> Result<&Parameter, DefinitionError> {
        self.parameters
            .get(name)
            .ok_or_else(|| unknown("parameter", name))
    }

    /// Resolve a registered request body by name.
    pub fn request_body(&self, name: &str) -> Result<&RequestBody, DefinitionError> {
        self.request_bodies
            .get(name)
            .ok_or_else(|| unknown("request body", name))
    }

    /// Resolve a registered response by name.
    pub fn response(&self, name: &str) -> Result<&Response, DefinitionError> {
        self.responses
            .get(name)
            .ok_or_else(|| unknown("response", name))
    }

    /// Resolve a registered example by name.
    pub fn example(&self, name: &str) -> Result<&ExampleObject, DefinitionError> {
        self.examples
            .get(name)
            .ok_or_else(|| unknown("example", name))
    }

    /// Resolve a registered security scheme by name.
    pub fn security_scheme(&self, name: &str) -> Result<&SecurityScheme, DefinitionError> {
        self.security_schemes
            .get(name)
            .ok_or_else(|| unknown("security scheme", name))
    }

    /// Resolve a registered operation by name.
    pub fn operation(&self, name: &str) -> Result<&Operation, DefinitionError> {
        self.operations
            .get(name)
            .ok_or_else(|| unknown("operation", name))
    }

    /// All registered schemas in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All registered parameters in registration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All registered request bodies in registration order.
    pub fn request_bodies(&self) -> impl Iterator<Item = (&str, &RequestBody)> {
        self.request_bodies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All registered responses in registration order.
    pub fn responses(&self) -> impl Iterator<Item = (&str, &Response)> {
        self.responses.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All registered examples in registration order.
    pub fn examples(&self) -> impl Iterator<Item = (&str, &ExampleObject)> {
        self.examples.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All registered security schemes in registration order.
    pub fn security_schemes(&self) -> impl Iterator<Item = (&str, &SecurityScheme)> {
        self.security_schemes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All registered operations in registration order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &Operation)> {
        self.operations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Document-level servers in declaration order.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// The stand-in value for an absent value of the given primitive
    /// kind in the given usage context, if one was declared.
    pub fn default_for(&self, kind: PrimitiveKind, usage: Usage) -> Option<&Value> {
        match usage {
            Usage::Request => self.defaults.within_requests.get(&kind),
            Usage::Response => self.defaults.within_responses.get(&kind),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────

    /// Close the registry for the process lifetime. Idempotent.
    ///
    /// Verifies discriminator mappings across all registered schemas.
    ///
    /// # Errors
    ///
    /// Returns `UnknownReference` if a discriminator maps to an
    /// unregistered schema, or `DuplicateDiscriminatorMapping` if one
    /// discriminator maps two values to the same variant.
    pub fn freeze(&mut self) -> Result<(), DefinitionError> {
        if self.frozen {
            return Ok(());
        }
        for schema in self.schemas.values() {
            self.verify_discriminators(schema)?;
        }
        debug!(
            schemas = self.schemas.len(),
            parameters = self.parameters.len(),
            request_bodies = self.request_bodies.len(),
            responses = self.responses.len(),
            examples = self.examples.len(),
            security_schemes = self.security_schemes.len(),
            operations = self.operations.len(),
            "definitions registry frozen"
        );
        self.frozen = true;
        Ok(())
    }

    /// Whether the registry has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_open(&self) -> Result<(), DefinitionError> {
        if self.frozen {
            Err(DefinitionError::FrozenModification {
                target: "definitions registry".into(),
            })
        } else {
            Ok(())
        }
    }

    /// Walk a schema tree verifying every discriminator it declares.
    fn verify_discriminators(&self, schema: &Schema) -> Result<(), DefinitionError> {
        if let Some(discriminator) = schema.discriminator() {
            let mut seen_variants: Vec<&str> = Vec::new();
            for variant in discriminator.mapping.values() {
                if !self.schemas.contains_key(variant) {
                    return Err(unknown("schema", variant));
                }
                if seen_variants.contains(&variant.as_str()) {
                    return Err(DefinitionError::DuplicateDiscriminatorMapping {
                        property: discriminator.property_name.clone(),
                        variant: variant.clone(),
                    });
                }
                seen_variants.push(variant);
            }
        }
        for nested in schema.properties().values() {
            self.verify_discriminators(nested)?;
        }
        if let Some(items) = schema.items() {
            self.verify_discriminators(items)?;
        }
        Ok(())
    }
}

fn unknown(entity: &'static str, name: &str) -> DefinitionError {
    DefinitionError::UnknownReference {
        entity,
        name: name.to_string(),
    }
}
