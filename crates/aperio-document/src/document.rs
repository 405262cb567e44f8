//! # Whole-Document Assembly
//!
//! Renders one frozen definitions registry into a complete document for
//! a target dialect, and computes the content-addressed digest that
//! identifies the rendered document.

use serde_json::{json, Map, Value};
use tracing::debug;

use aperio_core::{sha256_digest, CanonicalBytes, ContentDigest, DefinitionError};
use aperio_schema::Definitions;

use crate::project::ToDocument;
use crate::version::DocVersion;

/// Top-level document metadata.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// The API title.
    pub title: String,
    /// The API version (the described API's own version, not the
    /// dialect).
    pub version: String,
    /// Human-readable description.
    pub description: Option<String>,
}

impl DocumentInfo {
    /// Document metadata with the given title and API version.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
        }
    }

    /// Set the description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    fn to_value(&self) -> Value {
        let mut info = Map::new();
        info.insert("title".into(), json!(self.title));
        if let Some(description) = &self.description {
            info.insert("description".into(), json!(description));
        }
        info.insert("version".into(), json!(self.version));
        Value::Object(info)
    }
}

/// Project a section of named entities, omitting the section entirely
/// when nothing in it renders for the dialect.
fn section<'a, T, I>(
    entries: I,
    defs: &Definitions,
    version: DocVersion,
) -> Result<Option<Value>, DefinitionError>
where
    T: ToDocument + 'a,
    I: Iterator<Item = (&'a str, &'a T)>,
{
    let mut out = Map::new();
    for (name, entity) in entries {
        if let Some(projected) = entity.to_document(defs, version)? {
            out.insert(name.to_string(), projected);
        }
    }
    if out.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Object(out)))
    }
}

/// Render a registry into a complete document for the target dialect.
///
/// Operations group under `paths` by path template, keyed by lowercase
/// method; reusable entities land under `definitions` and
/// `securityDefinitions` (earliest dialect) or `components` (later
/// dialects).
pub fn to_document(
    defs: &Definitions,
    info: &DocumentInfo,
    version: DocVersion,
) -> Result<Value, DefinitionError> {
    let mut out = Map::new();
    if version.has_components() {
        out.insert("openapi".into(), json!(version.as_str()));
    } else {
        out.insert("swagger".into(), json!(version.as_str()));
    }
    out.insert("info".into(), info.to_value());

    if version.has_components() {
        let mut servers = Vec::new();
        for server in defs.servers() {
            if let Some(projected) = server.to_document(defs, version)? {
                servers.push(projected);
            }
        }
        if !servers.is_empty() {
            out.insert("servers".into(), Value::Array(servers));
        }
    }

    let mut paths: Map<String, Value> = Map::new();
    let mut operation_count = 0usize;
    for (_, operation) in defs.operations() {
        if let Some(projected) = operation.to_document(defs, version)? {
            let entry = paths
                .entry(operation.path.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(methods) = entry {
                methods.insert(operation.method.as_str().to_string(), projected);
            }
            operation_count += 1;
        }
    }
    out.insert("paths".into(), Value::Object(paths));

    if version.has_components() {
        let mut components = Map::new();
        let sections = [
            ("schemas", section(defs.schemas(), defs, version)?),
            ("parameters", section(defs.parameters(), defs, version)?),
            (
                "requestBodies",
                section(defs.request_bodies(), defs, version)?,
            ),
            ("responses", section(defs.responses(), defs, version)?),
            ("examples", section(defs.examples(), defs, version)?),
            (
                "securitySchemes",
                section(defs.security_schemes(), defs, version)?,
            ),
        ];
        for (key, rendered) in sections {
            if let Some(rendered) = rendered {
                components.insert(key.to_string(), rendered);
            }
        }
        if !components.is_empty() {
            out.insert("components".into(), Value::Object(components));
        }
    } else {
        if let Some(rendered) = section(defs.schemas(), defs, version)? {
            out.insert("definitions".into(), rendered);
        }
        if let Some(rendered) = section(defs.security_schemes(), defs, version)? {
            out.insert("securityDefinitions".into(), rendered);
        }
    }

    debug!(
        %version,
        paths = out["paths"].as_object().map_or(0, |p| p.len()),
        operations = operation_count,
        "document projected"
    );
    Ok(Value::Object(out))
}

/// The content-addressed digest of a rendered document.
///
/// Canonicalizes the document (RFC 8785) so key order and whitespace
/// never change the digest.
pub fn document_digest(document: &Value) -> Result<ContentDigest, DefinitionError> {
    let canonical = CanonicalBytes::new(document)?;
    Ok(sha256_digest(&canonical))
}
