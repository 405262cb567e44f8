//! # Value Wrapper — Raw JSON to a Typed, Validated Tree
//!
//! [`wrap`] pairs a raw JSON value with its governing [`Schema`] and
//! produces an immutable [`Node`] tree. Wrapping is a pure dispatch on
//! schema kind; validation is a separate pass that walks the tree once,
//! accumulating every violation into an [`ErrorSink`].
//!
//! ## Design
//!
//! - Default substitution happens first: an absent or null value takes
//!   the registered context default for its primitive kind before any
//!   existence check runs.
//! - References resolve lazily, one indirection at a time, under a
//!   shared depth bound so self-referential schemas terminate on finite
//!   input and reference cycles fail with a recursion-limit error
//!   instead of exhausting the stack.
//! - Input problems never abort wrapping. A type mismatch or an
//!   unmapped discriminator value becomes a node that reports its
//!   violation at validate time, so one pass collects the full set of
//!   problems in a payload.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use aperio_core::{
    AttrPath, AttrValue, Attrs, DefinitionError, ErrorSink, Presence, Violation, ViolationKind,
};

use crate::registry::{Definitions, Usage};
use crate::schema::{AdditionalProperties, Schema, SchemaKind};

/// Bound on reference indirections plus tree depth within one wrap call.
pub const MAX_WRAP_DEPTH: usize = 64;

/// Options for [`Node::serializable_value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOpts {
    /// Render scalar leaves as strings (query/header surfaces).
    pub stringify: bool,
}

/// The typed representation behind one wrapped node.
#[derive(Debug, Clone)]
pub enum Repr<'d> {
    /// No value was supplied and no default applied.
    Absent,
    /// An explicit null.
    Null,
    /// A boolean scalar.
    Boolean(bool),
    /// An integer scalar.
    Integer(i64),
    /// A floating-point scalar.
    Number(f64),
    /// A string scalar.
    String(String),
    /// An array of wrapped items.
    Array(Vec<Node<'d>>),
    /// An array whose schema declares no item schema; elements pass
    /// through unvalidated.
    Untyped(Value),
    /// An object of wrapped members.
    Object(ObjectRepr<'d>),
    /// The raw value's type does not fit the schema kind.
    Mismatch(Value),
    /// A discriminator could not select a variant from the raw value.
    UnknownVariant {
        /// The raw object, preserved for re-serialization.
        raw: Value,
        /// Why variant selection failed.
        reason: String,
    },
}

/// Wrapped members of an object node.
#[derive(Debug, Clone)]
pub struct ObjectRepr<'d> {
    /// Declared properties, every one present as a node (absent
    /// properties wrap to absent nodes so existence still runs).
    members: IndexMap<String, Node<'d>>,
    /// Undeclared properties, held raw; the additional-properties
    /// policy decides their fate at validate time.
    extras: IndexMap<String, Value>,
}

/// An immutable wrapper pairing a raw value with its governing schema.
#[derive(Debug, Clone)]
pub struct Node<'d> {
    schema: &'d Schema,
    path: AttrPath,
    presence: Presence,
    repr: Repr<'d>,
}

/// Wrap a raw value against a schema, resolving references through the
/// registry.
///
/// # Errors
///
/// Fails only on definition defects: an unresolvable reference or a
/// reference cycle deeper than [`MAX_WRAP_DEPTH`]. Bad input never
/// fails here; it surfaces as violations from [`Node::validate`].
pub fn wrap<'d>(
    raw: Option<Value>,
    schema: &'d Schema,
    defs: &'d Definitions,
    usage: Usage,
) -> Result<Node<'d>, DefinitionError> {
    wrap_at(raw, schema, defs, usage, AttrPath::root(), 0)
}

fn wrap_at<'d>(
    raw: Option<Value>,
    schema: &'d Schema,
    defs: &'d Definitions,
    usage: Usage,
    path: AttrPath,
    depth: usize,
) -> Result<Node<'d>, DefinitionError> {
    if depth >= MAX_WRAP_DEPTH {
        return Err(DefinitionError::RecursionLimit { depth });
    }

    // One indirection per step, each counted against the depth bound.
    let mut schema = schema;
    let mut depth = depth;
    while let SchemaKind::Reference(name) = schema.kind() {
        schema = defs.schema(name)?;
        depth += 1;
        if depth >= MAX_WRAP_DEPTH {
            return Err(DefinitionError::RecursionLimit { depth });
        }
    }

    // Context default stands in for an absent or null value.
    let mut raw = raw;
    if matches!(Presence::of(raw.as_ref()), Presence::Absent | Presence::Null) {
        if let Some(kind) = schema.kind().primitive() {
            if let Some(default) = defs.default_for(kind, usage) {
                raw = Some(default.clone());
            }
        }
    }

    // Discriminator selection happens before any member is wrapped; a
    // successful lookup delegates the whole object to the variant.
    let selection = match (schema.discriminator(), raw.as_ref()) {
        (Some(discriminator), Some(Value::Object(map))) => {
            Some(match map.get(&discriminator.property_name) {
                Some(Value::String(tag)) => match discriminator.mapping.get(tag) {
                    Some(variant) => Ok(defs.schema(variant)?),
                    None => Err(format!(
                        "discriminator {:?} value {tag:?} has no registered variant",
                        discriminator.property_name
                    )),
                },
                Some(_) => Err(format!(
                    "discriminator {:?} must be a string",
                    discriminator.property_name
                )),
                None => Err(format!(
                    "missing discriminator property {:?}",
                    discriminator.property_name
                )),
            })
        }
        _ => None,
    };
    match selection {
        Some(Ok(variant_schema)) => {
            return wrap_at(raw, variant_schema, defs, usage, path, depth + 1);
        }
        Some(Err(reason)) => {
            let presence = Presence::of(raw.as_ref());
            let repr = Repr::UnknownVariant {
                raw: raw.unwrap_or(Value::Null),
                reason,
            };
            return Ok(Node {
                schema,
                path,
                presence,
                repr,
            });
        }
        None => {}
    }

    let presence = Presence::of(raw.as_ref());
    let repr = match raw {
        None => Repr::Absent,
        Some(Value::Null) => Repr::Null,
        Some(value) => build_repr(value, schema, defs, usage, &path, depth)?,
    };

    Ok(Node {
        schema,
        path,
        presence,
        repr,
    })
}

fn build_repr<'d>(
    value: Value,
    schema: &'d Schema,
    defs: &'d Definitions,
    usage: Usage,
    path: &AttrPath,
    depth: usize,
) -> Result<Repr<'d>, DefinitionError> {
    match schema.kind() {
        SchemaKind::Boolean => match value {
            Value::Bool(b) => Ok(Repr::Boolean(b)),
            other => Ok(Repr::Mismatch(other)),
        },
        SchemaKind::Integer => match &value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Repr::Integer(i)),
                None => Ok(Repr::Mismatch(value)),
            },
            _ => Ok(Repr::Mismatch(value)),
        },
        SchemaKind::Number => match &value {
            Value::Number(n) => match n.as_f64() {
                Some(f) => Ok(Repr::Number(f)),
                None => Ok(Repr::Mismatch(value)),
            },
            _ => Ok(Repr::Mismatch(value)),
        },
        SchemaKind::String => match value {
            Value::String(s) => Ok(Repr::String(s)),
            other => Ok(Repr::Mismatch(other)),
        },
        SchemaKind::Array => match value {
            Value::Array(elements) => match schema.items() {
                Some(items) => {
                    let mut children = Vec::with_capacity(elements.len());
                    for (i, element) in elements.into_iter().enumerate() {
                        children.push(wrap_at(
                            Some(element),
                            items,
                            defs,
                            usage,
                            path.index(i),
                            depth + 1,
                        )?);
                    }
                    Ok(Repr::Array(children))
                }
                None => Ok(Repr::Untyped(Value::Array(elements))),
            },
            other => Ok(Repr::Mismatch(other)),
        },
        SchemaKind::Object => match value {
            Value::Object(map) => build_object(map, schema, defs, usage, path, depth),
            other => Ok(Repr::Mismatch(other)),
        },
        // References were already followed above.
        SchemaKind::Reference(name) => Err(DefinitionError::UnknownReference {
            entity: "schema",
            name: name.clone(),
        }),
    }
}

fn build_object<'d>(
    mut map: Map<String, Value>,
    schema: &'d Schema,
    defs: &'d Definitions,
    usage: Usage,
    path: &AttrPath,
    depth: usize,
) -> Result<Repr<'d>, DefinitionError> {
    let mut members = IndexMap::new();
    for (name, property) in schema.properties() {
        let supplied = map.remove(name);
        members.insert(
            name.clone(),
            wrap_at(
                supplied,
                property,
                defs,
                usage,
                path.key(name),
                depth + 1,
            )?,
        );
    }

    let mut extras = IndexMap::new();
    for (name, value) in map {
        match schema.additional_properties() {
            AdditionalProperties::Schema(extra_schema) => {
                let node = wrap_at(
                    Some(value),
                    extra_schema,
                    defs,
                    usage,
                    path.key(&name),
                    depth + 1,
                )?;
                members.insert(name, node);
            }
            AdditionalProperties::Allow | AdditionalProperties::Deny => {
                extras.insert(name, value);
            }
        }
    }

    Ok(Repr::Object(ObjectRepr { members, extras }))
}

impl<'d> Node<'d> {
    /// The resolved schema governing this node.
    pub fn schema(&self) -> &'d Schema {
        self.schema
    }

    /// Path of this node within the wrapped tree.
    pub fn path(&self) -> &AttrPath {
        &self.path
    }

    /// The typed representation.
    pub fn repr(&self) -> &Repr<'d> {
        &self.repr
    }

    /// How the raw value presented itself, after default substitution.
    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// Schema-driven validation, collecting every violation in the
    /// tree into the sink.
    ///
    /// Returns `false` iff at least one violation was pushed by this
    /// call: existence first (short-circuiting the node on failure),
    /// null succeeds immediately, then validators in declared order,
    /// then children, ANDed together.
    pub fn validate(&self, sink: &mut ErrorSink) -> bool {
        if !self.schema.existence().admits(self.presence) {
            sink.push(Violation::new(
                self.path.clone(),
                ViolationKind::Blank,
                format!(
                    "value is {} but must be {}",
                    presence_label(self.presence),
                    self.schema.existence()
                ),
            ));
            return false;
        }

        match &self.repr {
            Repr::Absent | Repr::Null => true,
            Repr::Mismatch(value) => {
                sink.push(Violation::new(
                    self.path.clone(),
                    ViolationKind::Type,
                    format!(
                        "expected {}, got {}",
                        self.schema.kind().name(),
                        json_type_name(value)
                    ),
                ));
                false
            }
            Repr::UnknownVariant { reason, .. } => {
                sink.push(Violation::new(
                    self.path.clone(),
                    ViolationKind::UnknownVariant,
                    reason.clone(),
                ));
                false
            }
            _ => {
                let mut ok = true;
                let value = self.value();
                for validator in self.schema.validators().values() {
                    if let Some(violation) = validator.check(&value, &self.path) {
                        sink.push(violation);
                        ok = false;
                    }
                }
                match &self.repr {
                    Repr::Array(items) => {
                        for child in items {
                            ok &= child.validate(sink);
                        }
                    }
                    Repr::Object(object) => {
                        for child in object.members.values() {
                            ok &= child.validate(sink);
                        }
                        if matches!(
                            self.schema.additional_properties(),
                            AdditionalProperties::Deny
                        ) {
                            for name in object.extras.keys() {
                                sink.push(Violation::new(
                                    self.path.key(name),
                                    ViolationKind::UnknownProperty,
                                    format!("property {name:?} is not declared"),
                                ));
                                ok = false;
                            }
                        }
                    }
                    _ => {}
                }
                ok
            }
        }
    }

    /// The plain JSON view of this node. Absent members are omitted,
    /// not emitted as null.
    pub fn value(&self) -> Value {
        match &self.repr {
            Repr::Absent | Repr::Null => Value::Null,
            Repr::Boolean(b) => Value::Bool(*b),
            Repr::Integer(i) => Value::from(*i),
            Repr::Number(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Repr::String(s) => Value::String(s.clone()),
            Repr::Array(items) => Value::Array(items.iter().map(Node::value).collect()),
            Repr::Untyped(value) | Repr::Mismatch(value) => value.clone(),
            Repr::UnknownVariant { raw, .. } => raw.clone(),
            Repr::Object(object) => {
                let mut out = Map::new();
                for (name, child) in &object.members {
                    if !matches!(child.repr, Repr::Absent) {
                        out.insert(name.clone(), child.value());
                    }
                }
                for (name, value) in &object.extras {
                    out.insert(name.clone(), value.clone());
                }
                Value::Object(out)
            }
        }
    }

    /// JSON-ready form honoring serialization options.
    pub fn serializable_value(&self, opts: &SerializeOpts) -> Value {
        if !opts.stringify {
            return self.value();
        }
        match &self.repr {
            Repr::Boolean(b) => Value::String(b.to_string()),
            Repr::Integer(i) => Value::String(i.to_string()),
            Repr::Number(f) => Value::String(f.to_string()),
            Repr::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|child| child.serializable_value(opts))
                    .collect(),
            ),
            Repr::Object(object) => {
                let mut out = Map::new();
                for (name, child) in &object.members {
                    if !matches!(child.repr, Repr::Absent) {
                        out.insert(name.clone(), child.serializable_value(opts));
                    }
                }
                for (name, value) in &object.extras {
                    out.insert(name.clone(), value.clone());
                }
                Value::Object(out)
            }
            _ => self.value(),
        }
    }

    /// The frozen, read-only attribute view handed to application code
    /// after validation.
    ///
    /// Object nodes produce one attribute per supplied member (nested
    /// objects become nested containers); other nodes produce an empty
    /// container.
    pub fn to_attrs(&self) -> Result<Attrs, DefinitionError> {
        let mut attrs = Attrs::new();
        if let Repr::Object(object) = &self.repr {
            for (name, child) in &object.members {
                match &child.repr {
                    Repr::Absent => continue,
                    Repr::Object(_) => {
                        attrs.set(name, AttrValue::Model(child.to_attrs()?))?;
                    }
                    _ => {
                        attrs.set(name, AttrValue::Scalar(child.value()))?;
                    }
                }
            }
            for (name, value) in &object.extras {
                attrs.set(name, AttrValue::Scalar(value.clone()))?;
            }
        }
        attrs.freeze();
        Ok(attrs)
    }
}

fn presence_label(presence: Presence) -> &'static str {
    match presence {
        Presence::Absent => "absent",
        Presence::Null => "null",
        Presence::Empty => "empty",
        Presence::Filled => "filled",
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
