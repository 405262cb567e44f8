//! # Coercion Wrapper — Loosely-Typed Surfaces to Schema-Typed JSON
//!
//! Query strings, headers, and form fields arrive as strings no matter
//! what the schema declares. [`DomNode`] mirrors the JSON wrap dispatch
//! but its source is a [`DomValue`] tree of raw strings; [`DomNode::cast`]
//! converts it to schema-typed JSON before the JSON wrapper takes over.
//!
//! Casting failures come from request input, so they report as
//! path-scoped violations through the shared sink, exactly like
//! validation failures, and never as definition errors. An empty string
//! for a non-string schema counts as absent, not as a failed cast.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use aperio_core::{AttrPath, DefinitionError, ErrorSink, Violation, ViolationKind};

use crate::registry::{Definitions, Usage};
use crate::schema::{Schema, SchemaKind};
use crate::wrap::{self, Node, MAX_WRAP_DEPTH};

/// Loosely-typed input as it arrives from a query/header/form surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DomValue {
    /// A raw string scalar.
    Str(String),
    /// A sequence of raw values (repeated parameters).
    Seq(Vec<DomValue>),
    /// A string-keyed mapping of raw values (bracketed form fields).
    Map(IndexMap<String, DomValue>),
}

impl DomValue {
    /// Convenience constructor for a raw string scalar.
    pub fn str(s: impl Into<String>) -> Self {
        DomValue::Str(s.into())
    }

    /// The JSON shape of this value with no schema applied: strings
    /// stay strings, sequences become arrays, mappings become objects.
    fn untyped(&self) -> Value {
        match self {
            DomValue::Str(s) => Value::String(s.clone()),
            DomValue::Seq(items) => Value::Array(items.iter().map(DomValue::untyped).collect()),
            DomValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.untyped()))
                    .collect(),
            ),
        }
    }
}

/// A coercion-layer node pairing raw surface input with its schema.
#[derive(Debug, Clone)]
pub struct DomNode<'d> {
    raw: DomValue,
    schema: &'d Schema,
    defs: &'d Definitions,
}

impl<'d> DomNode<'d> {
    /// Pair raw surface input with its governing schema.
    pub fn new(raw: DomValue, schema: &'d Schema, defs: &'d Definitions) -> Self {
        Self { raw, schema, defs }
    }

    /// Convert the raw input to its schema-typed JSON value.
    ///
    /// Returns `Ok(None)` when the input counts as absent (an empty
    /// string under a non-string schema, or a scalar that failed to
    /// parse; the failure is recorded in the sink).
    ///
    /// # Errors
    ///
    /// Fails only on definition defects during reference resolution.
    pub fn cast(&self, sink: &mut ErrorSink) -> Result<Option<Value>, DefinitionError> {
        cast_at(&self.raw, self.schema, self.defs, &AttrPath::root(), 0, sink)
    }
}

fn cast_at(
    raw: &DomValue,
    schema: &Schema,
    defs: &Definitions,
    path: &AttrPath,
    depth: usize,
    sink: &mut ErrorSink,
) -> Result<Option<Value>, DefinitionError> {
    if depth >= MAX_WRAP_DEPTH {
        return Err(DefinitionError::RecursionLimit { depth });
    }
    let mut schema = schema;
    let mut depth = depth;
    while let SchemaKind::Reference(name) = schema.kind() {
        schema = defs.schema(name)?;
        depth += 1;
        if depth >= MAX_WRAP_DEPTH {
            return Err(DefinitionError::RecursionLimit { depth });
        }
    }

    match raw {
        DomValue::Str(s) => Ok(cast_scalar(s, schema, path, sink)),
        DomValue::Seq(items) => match schema.kind() {
            SchemaKind::Array => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let cast = match schema.items() {
                        Some(item_schema) => {
                            cast_at(item, item_schema, defs, &path.index(i), depth + 1, sink)?
                        }
                        None => Some(item.untyped()),
                    };
                    if let Some(value) = cast {
                        out.push(value);
                    }
                }
                Ok(Some(Value::Array(out)))
            }
            _ => {
                sink.push(cast_violation(
                    path,
                    format!("cannot cast a sequence to {}", schema.kind().name()),
                ));
                Ok(None)
            }
        },
        DomValue::Map(map) => match schema.kind() {
            SchemaKind::Object => {
                let mut out = Map::new();
                for (name, item) in map {
                    let child_path = path.key(name);
                    let cast = match schema.properties().get(name) {
                        Some(property) => {
                            cast_at(item, property, defs, &child_path, depth + 1, sink)?
                        }
                        None => Some(item.untyped()),
                    };
                    if let Some(value) = cast {
                        out.insert(name.clone(), value);
                    }
                }
                Ok(Some(Value::Object(out)))
            }
            _ => {
                sink.push(cast_violation(
                    path,
                    format!("cannot cast a mapping to {}", schema.kind().name()),
                ));
                Ok(None)
            }
        },
    }
}

fn cast_scalar(raw: &str, schema: &Schema, path: &AttrPath, sink: &mut ErrorSink) -> Option<Value> {
    // An empty string under a non-string schema means the surface
    // carried the parameter name with no value; treat as absent.
    if raw.is_empty() && schema.kind() != &SchemaKind::String {
        return None;
    }
    match schema.kind() {
        SchemaKind::String => Some(Value::String(raw.to_string())),
        SchemaKind::Boolean => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => {
                sink.push(cast_violation(
                    path,
                    format!("{raw:?} is not a boolean (expected \"true\" or \"false\")"),
                ));
                None
            }
        },
        SchemaKind::Integer => match raw.parse::<i64>() {
            Ok(i) => Some(Value::from(i)),
            Err(_) => {
                sink.push(cast_violation(path, format!("{raw:?} is not an integer")));
                None
            }
        },
        SchemaKind::Number => match raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64)
        {
            Some(n) => Some(Value::Number(n)),
            None => {
                sink.push(cast_violation(path, format!("{raw:?} is not a number")));
                None
            }
        },
        SchemaKind::Array | SchemaKind::Object => {
            sink.push(cast_violation(
                path,
                format!("cannot cast a string to {}", schema.kind().name()),
            ));
            None
        }
        // References were already followed by the caller.
        SchemaKind::Reference(_) => None,
    }
}

fn cast_violation(path: &AttrPath, message: String) -> Violation {
    Violation::new(path.clone(), ViolationKind::Cast, message)
}

/// Cast raw surface input, then wrap the result as a JSON value tree.
///
/// Cast failures land in the sink; the returned node reflects whatever
/// survived the cast (possibly an absent node), so one validate pass
/// over it completes the violation report.
pub fn coerce<'d>(
    raw: DomValue,
    schema: &'d Schema,
    defs: &'d Definitions,
    usage: Usage,
    sink: &mut ErrorSink,
) -> Result<Node<'d>, DefinitionError> {
    let cast = DomNode::new(raw, schema, defs).cast(sink)?;
    wrap::wrap(cast, schema, defs, usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperio_core::Existence;
    use serde_json::json;

    fn build(kind: SchemaKind) -> Schema {
        Schema::builder(kind).build().unwrap()
    }

    fn cast_one(raw: DomValue, schema: &Schema) -> (Option<Value>, ErrorSink) {
        let defs = Definitions::new();
        let mut sink = ErrorSink::new();
        let cast = DomNode::new(raw, schema, &defs).cast(&mut sink).unwrap();
        (cast, sink)
    }

    #[test]
    fn test_cast_boolean_strings() {
        let schema = build(SchemaKind::Boolean);
        let (cast, sink) = cast_one(DomValue::str("true"), &schema);
        assert_eq!(cast, Some(json!(true)));
        assert!(sink.is_empty());
        let (cast, _) = cast_one(DomValue::str("false"), &schema);
        assert_eq!(cast, Some(json!(false)));
    }

    #[test]
    fn test_cast_numbers() {
        let (cast, sink) = cast_one(DomValue::str("42"), &build(SchemaKind::Integer));
        assert_eq!(cast, Some(json!(42)));
        assert!(sink.is_empty());
        let (cast, sink) = cast_one(DomValue::str("2.5"), &build(SchemaKind::Number));
        assert_eq!(cast, Some(json!(2.5)));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unparsable_nonempty_string_is_cast_violation() {
        for (raw, schema) in [
            ("yes", build(SchemaKind::Boolean)),
            ("4x", build(SchemaKind::Integer)),
            ("1.2.3", build(SchemaKind::Number)),
        ] {
            let (cast, sink) = cast_one(DomValue::str(raw), &schema);
            assert_eq!(cast, None);
            assert_eq!(sink.len(), 1);
            assert_eq!(sink.violations()[0].kind, ViolationKind::Cast);
        }
    }

    #[test]
    fn test_empty_string_is_absent_for_non_string_schemas() {
        for schema in [
            build(SchemaKind::Boolean),
            build(SchemaKind::Integer),
            build(SchemaKind::Number),
        ] {
            let (cast, sink) = cast_one(DomValue::str(""), &schema);
            assert_eq!(cast, None);
            assert!(sink.is_empty(), "empty string must not be a cast failure");
        }
        // Under a string schema the empty string is a real value.
        let (cast, _) = cast_one(DomValue::str(""), &build(SchemaKind::String));
        assert_eq!(cast, Some(json!("")));
    }

    #[test]
    fn test_cast_sequence_against_items() {
        let schema = Schema::builder(SchemaKind::Array)
            .items(build(SchemaKind::Integer))
            .build()
            .unwrap();
        let raw = DomValue::Seq(vec![DomValue::str("1"), DomValue::str("2")]);
        let (cast, sink) = cast_one(raw, &schema);
        assert_eq!(cast, Some(json!([1, 2])));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sequence_child_failures_are_path_scoped() {
        let schema = Schema::builder(SchemaKind::Array)
            .items(build(SchemaKind::Integer))
            .build()
            .unwrap();
        let raw = DomValue::Seq(vec![DomValue::str("1"), DomValue::str("oops")]);
        let (cast, sink) = cast_one(raw, &schema);
        assert_eq!(cast, Some(json!([1])));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.violations()[0].path.to_string(), "/1");
    }

    #[test]
    fn test_cast_mapping_against_properties() {
        let schema = Schema::builder(SchemaKind::Object)
            .property("limit", build(SchemaKind::Integer))
            .property("q", build(SchemaKind::String))
            .build()
            .unwrap();
        let mut map = IndexMap::new();
        map.insert("limit".to_string(), DomValue::str("25"));
        map.insert("q".to_string(), DomValue::str("widgets"));
        map.insert("extra".to_string(), DomValue::str("kept"));
        let (cast, sink) = cast_one(DomValue::Map(map), &schema);
        assert_eq!(
            cast,
            Some(json!({"limit": 25, "q": "widgets", "extra": "kept"}))
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_cast_violation() {
        let (cast, sink) = cast_one(
            DomValue::Seq(vec![DomValue::str("a")]),
            &build(SchemaKind::String),
        );
        assert_eq!(cast, None);
        assert_eq!(sink.violations()[0].kind, ViolationKind::Cast);
    }

    #[test]
    fn test_coerce_then_validate() {
        let defs = Definitions::new();
        let schema = Schema::builder(SchemaKind::Object)
            .property("active", build(SchemaKind::Boolean))
            .property(
                "limit",
                Schema::builder(SchemaKind::Integer)
                    .existence(Existence::None)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let mut map = IndexMap::new();
        map.insert("active".to_string(), DomValue::str("true"));
        map.insert("limit".to_string(), DomValue::str(""));
        let mut sink = ErrorSink::new();
        let node = coerce(DomValue::Map(map), &schema, &defs, Usage::Request, &mut sink).unwrap();
        assert!(node.validate(&mut sink), "{sink}");
        assert_eq!(node.value(), json!({"active": true}));
    }

    #[test]
    fn test_coerce_reports_cast_and_validation_together() {
        let defs = Definitions::new();
        let schema = Schema::builder(SchemaKind::Object)
            .property("q", build(SchemaKind::String))
            .property("count", build(SchemaKind::Integer))
            .build()
            .unwrap();
        let mut map = IndexMap::new();
        map.insert("q".to_string(), DomValue::str("widgets"));
        map.insert("count".to_string(), DomValue::str("many"));
        let mut sink = ErrorSink::new();
        let node = coerce(DomValue::Map(map), &schema, &defs, Usage::Request, &mut sink).unwrap();
        assert!(!node.validate(&mut sink));
        // One cast failure plus one blank for the now-absent member.
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.violations()[0].kind, ViolationKind::Cast);
        assert_eq!(sink.violations()[0].path.to_string(), "/count");
        assert_eq!(sink.violations()[1].kind, ViolationKind::Blank);
        assert_eq!(sink.violations()[1].path.to_string(), "/count");
    }
}
