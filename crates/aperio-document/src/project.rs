//! # Entity Projection — One Graph, Four Document Shapes
//!
//! [`ToDocument`] renders a definition entity into the nested mapping a
//! target dialect expects. Projection is a pure function of (entity,
//! registry, version):
//!
//! - fields a dialect does not know are omitted, never emitted as null,
//! - entities a dialect predates produce no output at all (`Ok(None)`),
//!   never an empty object,
//! - vendor extensions merge in last, so they can override computed
//!   fields.

use serde_json::{json, Map, Value};

use aperio_core::{CanonicalizationError, DefinitionError, Existence};
use aperio_schema::{
    AdditionalProperties, Definitions, ExampleObject, HttpScheme, Link, MediaTypeObject,
    Operation, Parameter, ParameterRef, RequestBody, RequestBodyRef, Response, ResponseRef,
    Schema, SchemaKind, SecurityScheme, Server,
};

use crate::version::DocVersion;

/// Render an entity into the shape a target dialect expects.
pub trait ToDocument {
    /// Project the entity, resolving named references through the
    /// registry.
    ///
    /// Returns `Ok(None)` when the dialect predates the entity.
    fn to_document(
        &self,
        defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError>;
}

fn insert_str(out: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn merge_extensions(
    out: &mut Map<String, Value>,
    extensions: &indexmap::IndexMap<String, Value>,
) {
    for (key, value) in extensions {
        out.insert(key.clone(), value.clone());
    }
}

/// Whether a property with this existence policy must be present.
fn is_required(existence: Existence) -> bool {
    existence >= Existence::AllowEmpty
}

impl ToDocument for Schema {
    fn to_document(
        &self,
        defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        if let SchemaKind::Reference(name) = self.kind() {
            // Verify the target exists so broken references fail at
            // projection time, not when a consumer follows the pointer.
            defs.schema(name)?;
            return Ok(Some(json!({
                "$ref": format!("{}{name}", version.schema_ref_prefix()),
            })));
        }

        let mut out = Map::new();
        let type_name = self.kind().name();
        let nullable = self.existence().accepts_null();
        if nullable && version.null_as_type_array() {
            out.insert("type".into(), json!([type_name, "null"]));
        } else {
            out.insert("type".into(), json!(type_name));
            if nullable && version == DocVersion::V3_0 {
                out.insert("nullable".into(), json!(true));
            }
        }

        insert_str(&mut out, "description", self.description());
        if self.deprecated() && version >= DocVersion::V3_0 {
            out.insert("deprecated".into(), json!(true));
        }

        for (kind, validator) in self.validators() {
            out.insert(kind.keyword().to_string(), validator.control_value());
        }

        if let Some(items) = self.items() {
            if let Some(projected) = items.to_document(defs, version)? {
                out.insert("items".into(), projected);
            }
        }

        if !self.properties().is_empty() {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for (name, property) in self.properties() {
                if let Some(projected) = property.to_document(defs, version)? {
                    properties.insert(name.clone(), projected);
                }
                if is_required(property.existence()) {
                    required.push(json!(name));
                }
            }
            out.insert("properties".into(), Value::Object(properties));
            if !required.is_empty() {
                out.insert("required".into(), Value::Array(required));
            }
        }

        match self.additional_properties() {
            AdditionalProperties::Allow => {}
            AdditionalProperties::Deny => {
                out.insert("additionalProperties".into(), json!(false));
            }
            AdditionalProperties::Schema(schema) => {
                if let Some(projected) = schema.to_document(defs, version)? {
                    out.insert("additionalProperties".into(), projected);
                }
            }
        }

        if version >= DocVersion::V3_0 {
            if let Some(discriminator) = self.discriminator() {
                let mapping: Map<String, Value> = discriminator
                    .mapping
                    .iter()
                    .map(|(value, variant)| {
                        (
                            value.clone(),
                            json!(format!("{}{variant}", version.schema_ref_prefix())),
                        )
                    })
                    .collect();
                out.insert(
                    "discriminator".into(),
                    json!({
                        "propertyName": discriminator.property_name,
                        "mapping": mapping,
                    }),
                );
            }
        }

        if let Some(example) = self.example() {
            out.insert("example".into(), example.clone());
        }

        merge_extensions(&mut out, self.extensions());
        Ok(Some(Value::Object(out)))
    }
}

impl ToDocument for Parameter {
    fn to_document(
        &self,
        defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        let mut out = Map::new();
        out.insert("name".into(), json!(self.name));
        out.insert("in".into(), json!(self.location.as_str()));
        insert_str(&mut out, "description", self.description.as_deref());
        if self.required {
            out.insert("required".into(), json!(true));
        }
        if self.deprecated && version >= DocVersion::V3_0 {
            out.insert("deprecated".into(), json!(true));
        }
        if self.allow_empty_value {
            out.insert("allowEmptyValue".into(), json!(true));
        }

        if version.wraps_parameter_schema() {
            if let Some(projected) = self.schema.to_document(defs, version)? {
                out.insert("schema".into(), projected);
            }
        } else {
            // Earlier dialects inline the type keywords directly on the
            // parameter object; references must be resolved first since
            // a parameter cannot carry `$ref` there.
            let resolved = self.schema.resolve(defs)?;
            if let Some(Value::Object(fields)) = resolved.to_document(defs, version)? {
                for (key, value) in fields {
                    if key != "description" {
                        out.insert(key, value);
                    }
                }
            }
        }

        merge_extensions(&mut out, &self.extensions);
        Ok(Some(Value::Object(out)))
    }
}

/// The `content` entry for one media type (dialects 3.0 and newer).
fn media_type_doc(
    media: &MediaTypeObject,
    defs: &Definitions,
    version: DocVersion,
) -> Result<Value, DefinitionError> {
    let mut out = Map::new();
    if let Some(projected) = media.schema.to_document(defs, version)? {
        out.insert("schema".into(), projected);
    }
    if let Some(example) = &media.example {
        out.insert("example".into(), example.clone());
    }
    if !media.example_refs.is_empty() {
        let mut examples = Map::new();
        for name in &media.example_refs {
            defs.example(name)?;
            examples.insert(
                name.clone(),
                json!({ "$ref": format!("#/components/examples/{name}") }),
            );
        }
        out.insert("examples".into(), Value::Object(examples));
    }
    Ok(Value::Object(out))
}

impl ToDocument for RequestBody {
    fn to_document(
        &self,
        defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        // Swagger 2.0 has no request-body entity; the operation
        // projection renders it as a `body` parameter plus `consumes`.
        if !version.has_components() {
            return Ok(None);
        }
        let mut out = Map::new();
        insert_str(&mut out, "description", self.description.as_deref());
        if self.required {
            out.insert("required".into(), json!(true));
        }
        let mut content = Map::new();
        for (media_type, media) in &self.contents {
            content.insert(media_type.clone(), media_type_doc(media, defs, version)?);
        }
        out.insert("content".into(), Value::Object(content));
        Ok(Some(Value::Object(out)))
    }
}

impl ToDocument for Response {
    fn to_document(
        &self,
        defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        let mut out = Map::new();
        out.insert("description".into(), json!(self.description));

        if !self.headers.is_empty() {
            let mut headers = Map::new();
            for (name, schema) in &self.headers {
                let header = if version.wraps_parameter_schema() {
                    match schema.to_document(defs, version)? {
                        Some(projected) => json!({ "schema": projected }),
                        None => continue,
                    }
                } else {
                    schema
                        .resolve(defs)?
                        .to_document(defs, version)?
                        .unwrap_or(Value::Object(Map::new()))
                };
                headers.insert(name.clone(), header);
            }
            out.insert("headers".into(), Value::Object(headers));
        }

        if version.has_components() {
            if !self.contents.is_empty() {
                let mut content = Map::new();
                for (media_type, media) in &self.contents {
                    content.insert(media_type.clone(), media_type_doc(media, defs, version)?);
                }
                out.insert("content".into(), Value::Object(content));
            }
            if !self.links.is_empty() {
                let mut links = Map::new();
                for (name, link) in &self.links {
                    if let Some(projected) = link.to_document(defs, version)? {
                        links.insert(name.clone(), projected);
                    }
                }
                out.insert("links".into(), Value::Object(links));
            }
        } else if let Some((_, media)) = self.contents.first() {
            // Swagger 2.0 carries a single schema per response.
            if let Some(projected) = media.schema.to_document(defs, version)? {
                out.insert("schema".into(), projected);
            }
        }

        Ok(Some(Value::Object(out)))
    }
}

impl ToDocument for ExampleObject {
    fn to_document(
        &self,
        _defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        if !version.has_components() {
            return Ok(None);
        }
        let mut out = Map::new();
        insert_str(&mut out, "summary", self.summary.as_deref());
        insert_str(&mut out, "description", self.description.as_deref());
        if let Some(value) = &self.value {
            if version.split_example_values() {
                let serialized = serde_json::to_string(value)
                    .map_err(CanonicalizationError::SerializationFailed)?;
                out.insert("dataValue".into(), value.clone());
                out.insert("serializedValue".into(), json!(serialized));
            } else {
                out.insert("value".into(), value.clone());
            }
        }
        insert_str(&mut out, "externalValue", self.external_value.as_deref());
        Ok(Some(Value::Object(out)))
    }
}

impl ToDocument for SecurityScheme {
    fn to_document(
        &self,
        _defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        let doc = match self {
            SecurityScheme::ApiKey { name, location } => json!({
                "type": "apiKey",
                "name": name,
                "in": location.as_str(),
            }),
            SecurityScheme::Http {
                scheme: HttpScheme::Basic,
                ..
            } => {
                if version.has_components() {
                    json!({ "type": "http", "scheme": "basic" })
                } else {
                    json!({ "type": "basic" })
                }
            }
            SecurityScheme::Http {
                scheme: HttpScheme::Bearer,
                bearer_format,
            } => {
                // Bearer schemes postdate the earliest dialect; there
                // they yield no output at all.
                if !version.has_components() {
                    return Ok(None);
                }
                let mut out = Map::new();
                out.insert("type".into(), json!("http"));
                out.insert("scheme".into(), json!("bearer"));
                insert_str(&mut out, "bearerFormat", bearer_format.as_deref());
                Value::Object(out)
            }
        };
        Ok(Some(doc))
    }
}

impl ToDocument for Server {
    fn to_document(
        &self,
        _defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        if !version.has_components() {
            return Ok(None);
        }
        let mut out = Map::new();
        if version.named_servers() {
            insert_str(&mut out, "name", self.name.as_deref());
        }
        out.insert("url".into(), json!(self.url));
        insert_str(&mut out, "description", self.description.as_deref());
        if !self.variables.is_empty() {
            let mut variables = Map::new();
            for (name, variable) in &self.variables {
                let mut var = Map::new();
                var.insert("default".into(), json!(variable.default));
                if !variable.enumeration.is_empty() {
                    var.insert("enum".into(), json!(variable.enumeration));
                }
                insert_str(&mut var, "description", variable.description.as_deref());
                variables.insert(name.clone(), Value::Object(var));
            }
            out.insert("variables".into(), Value::Object(variables));
        }
        Ok(Some(Value::Object(out)))
    }
}

impl ToDocument for Link {
    fn to_document(
        &self,
        _defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        if !version.has_components() {
            return Ok(None);
        }
        let mut out = Map::new();
        if version.named_servers() {
            insert_str(&mut out, "name", self.name.as_deref());
        }
        out.insert("operationId".into(), json!(self.operation_id));
        insert_str(&mut out, "description", self.description.as_deref());
        if !self.parameters.is_empty() {
            let parameters: Map<String, Value> = self
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            out.insert("parameters".into(), Value::Object(parameters));
        }
        Ok(Some(Value::Object(out)))
    }
}

fn resolve_body<'a>(
    body: &'a RequestBodyRef,
    defs: &'a Definitions,
) -> Result<&'a RequestBody, DefinitionError> {
    match body {
        RequestBodyRef::Named(name) => defs.request_body(name),
        RequestBodyRef::Inline(body) => Ok(body.as_ref()),
    }
}

impl ToDocument for Operation {
    fn to_document(
        &self,
        defs: &Definitions,
        version: DocVersion,
    ) -> Result<Option<Value>, DefinitionError> {
        let mut out = Map::new();
        insert_str(&mut out, "operationId", self.operation_id.as_deref());
        insert_str(&mut out, "summary", self.summary.as_deref());
        insert_str(&mut out, "description", self.description.as_deref());
        if !self.tags.is_empty() {
            out.insert("tags".into(), json!(self.tags));
        }
        if self.deprecated {
            out.insert("deprecated".into(), json!(true));
        }

        let mut parameters = Vec::new();
        for parameter in &self.parameters {
            let resolved = match parameter {
                ParameterRef::Named(name) => defs.parameter(name)?,
                ParameterRef::Inline(parameter) => parameter.as_ref(),
            };
            if let Some(projected) = resolved.to_document(defs, version)? {
                parameters.push(projected);
            }
        }

        if let Some(body_ref) = &self.request_body {
            let body = resolve_body(body_ref, defs)?;
            if version.has_components() {
                if let Some(projected) = body.to_document(defs, version)? {
                    out.insert("requestBody".into(), projected);
                }
            } else {
                // The earliest dialect models the body as one more
                // parameter and lists media types under `consumes`.
                let mut body_param = Map::new();
                body_param.insert("name".into(), json!("body"));
                body_param.insert("in".into(), json!("body"));
                insert_str(&mut body_param, "description", body.description.as_deref());
                if body.required {
                    body_param.insert("required".into(), json!(true));
                }
                if let Some((_, media)) = body.contents.first() {
                    if let Some(projected) = media.schema.to_document(defs, version)? {
                        body_param.insert("schema".into(), projected);
                    }
                }
                parameters.push(Value::Object(body_param));
                if !body.contents.is_empty() {
                    let consumes: Vec<&String> = body.contents.keys().collect();
                    out.insert("consumes".into(), json!(consumes));
                }
            }
        }

        if !parameters.is_empty() {
            out.insert("parameters".into(), Value::Array(parameters));
        }

        let mut responses = Map::new();
        for (status, response_ref) in self.statuses_by_priority() {
            let resolved = match response_ref {
                ResponseRef::Named(name) => defs.response(name)?,
                ResponseRef::Inline(response) => response.as_ref(),
            };
            if let Some(projected) = resolved.to_document(defs, version)? {
                responses.insert(status.to_string(), projected);
            }
        }
        if !responses.is_empty() {
            out.insert("responses".into(), Value::Object(responses));
        }

        if !self.security.is_empty() {
            let requirements: Vec<Value> = self
                .security
                .iter()
                .map(|name| {
                    let mut requirement = Map::new();
                    requirement.insert(name.clone(), json!([]));
                    Value::Object(requirement)
                })
                .collect();
            out.insert("security".into(), Value::Array(requirements));
        }

        if version.has_components() && !self.servers.is_empty() {
            let mut servers = Vec::new();
            for server in &self.servers {
                if let Some(projected) = server.to_document(defs, version)? {
                    servers.push(projected);
                }
            }
            out.insert("servers".into(), Value::Array(servers));
        }

        merge_extensions(&mut out, &self.extensions);
        Ok(Some(Value::Object(out)))
    }
}
