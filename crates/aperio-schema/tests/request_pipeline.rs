//! Integration test: the full inbound request pipeline.
//!
//! Builds a definitions registry the way an application would at
//! startup, freezes it, then pushes query-string input through the
//! coercion wrapper and a JSON body through the value wrapper, ending
//! with the frozen attribute view application code reads.

use indexmap::IndexMap;
use serde_json::{json, Value};

use aperio_core::{AttrValue, DefinitionError, ErrorSink, Existence, ViolationKind};
use aperio_schema::{
    coerce, wrap, Definitions, DomValue, PrimitiveKind, Schema, SchemaKind, Usage, Validator,
};

/// A registry resembling a small pet-store API definition set.
fn pet_store() -> Definitions {
    let mut defs = Definitions::new();

    defs.add_schema(
        "Pet",
        Schema::builder(SchemaKind::Object)
            .property(
                "name",
                Schema::builder(SchemaKind::String)
                    .validator(Validator::min_length(1))
                    .validator(Validator::max_length(64))
                    .build()
                    .unwrap(),
            )
            .property(
                "age",
                Schema::builder(SchemaKind::Integer)
                    .validator(Validator::minimum(&json!(0)).unwrap())
                    .build()
                    .unwrap(),
            )
            .property(
                "tags",
                Schema::builder(SchemaKind::Array)
                    .existence(Existence::AllowEmpty)
                    .items(Schema::builder(SchemaKind::String).build().unwrap())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap(),
    )
    .unwrap();

    defs.add_schema(
        "PetList",
        Schema::builder(SchemaKind::Array)
            .items(Schema::reference("Pet"))
            .build()
            .unwrap(),
    )
    .unwrap();

    defs.add_default(PrimitiveKind::Array, Usage::Request, json!([]))
        .unwrap();
    defs.freeze().unwrap();
    defs
}

#[test]
fn test_valid_body_round_trip() {
    let defs = pet_store();
    let schema = Schema::reference("Pet");
    let raw = json!({"name": "Rex", "age": 3, "tags": ["good"]});

    let node = wrap(Some(raw.clone()), &schema, &defs, Usage::Request).unwrap();
    let mut sink = ErrorSink::new();
    assert!(node.validate(&mut sink), "{sink}");
    assert_eq!(node.value(), raw);

    let attrs = node.to_attrs().unwrap();
    assert!(attrs.is_frozen());
    assert_eq!(attrs.get("name"), &AttrValue::Scalar(json!("Rex")));
    assert_eq!(attrs.get("age"), &AttrValue::Scalar(json!(3)));
}

#[test]
fn test_absent_array_takes_request_default() {
    let defs = pet_store();
    let schema = Schema::reference("Pet");
    let raw = json!({"name": "Rex", "age": 3});

    let node = wrap(Some(raw), &schema, &defs, Usage::Request).unwrap();
    let mut sink = ErrorSink::new();
    assert!(node.validate(&mut sink), "{sink}");
    assert_eq!(node.value()["tags"], json!([]));
}

#[test]
fn test_invalid_body_reports_every_problem_once() {
    let defs = pet_store();
    let schema = Schema::reference("Pet");
    let raw = json!({"name": "", "age": -1, "tags": [7]});

    let node = wrap(Some(raw), &schema, &defs, Usage::Request).unwrap();
    let mut sink = ErrorSink::new();
    assert!(!node.validate(&mut sink));

    let kinds: Vec<(String, ViolationKind)> = sink
        .violations()
        .iter()
        .map(|v| (v.path.to_string(), v.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("/name".to_string(), ViolationKind::Blank),
            ("/age".to_string(), ViolationKind::Minimum),
            ("/tags/0".to_string(), ViolationKind::Type),
        ]
    );

    // A second pass over the same tree yields the identical report.
    let mut again = ErrorSink::new();
    node.validate(&mut again);
    assert_eq!(sink.violations(), again.violations());
}

#[test]
fn test_nested_reference_paths_in_violations() {
    let defs = pet_store();
    let schema = Schema::reference("PetList");
    let raw = json!([
        {"name": "Rex", "age": 3, "tags": []},
        {"name": "Mitzi", "age": -2, "tags": []}
    ]);

    let node = wrap(Some(raw), &schema, &defs, Usage::Request).unwrap();
    let mut sink = ErrorSink::new();
    assert!(!node.validate(&mut sink));
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.violations()[0].path.to_string(), "/1/age");
}

#[test]
fn test_query_string_coercion_end_to_end() {
    let defs = pet_store();
    let filter = Schema::builder(SchemaKind::Object)
        .property(
            "limit",
            Schema::builder(SchemaKind::Integer)
                .validator(Validator::minimum(&json!(1)).unwrap())
                .validator(Validator::maximum(&json!(100)).unwrap())
                .build()
                .unwrap(),
        )
        .property(
            "verbose",
            Schema::builder(SchemaKind::Boolean)
                .existence(Existence::None)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let mut raw = IndexMap::new();
    raw.insert("limit".to_string(), DomValue::str("25"));
    raw.insert("verbose".to_string(), DomValue::str("true"));

    let mut sink = ErrorSink::new();
    let node = coerce(DomValue::Map(raw), &filter, &defs, Usage::Request, &mut sink).unwrap();
    assert!(node.validate(&mut sink), "{sink}");
    assert_eq!(node.value(), json!({"limit": 25, "verbose": true}));
}

#[test]
fn test_query_string_cast_failure_is_path_scoped() {
    let defs = pet_store();
    let filter = Schema::builder(SchemaKind::Object)
        .property("q", Schema::builder(SchemaKind::String).build().unwrap())
        .property(
            "limit",
            Schema::builder(SchemaKind::Integer).build().unwrap(),
        )
        .build()
        .unwrap();

    let mut raw = IndexMap::new();
    raw.insert("q".to_string(), DomValue::str("widgets"));
    raw.insert("limit".to_string(), DomValue::str("lots"));

    let mut sink = ErrorSink::new();
    let node = coerce(DomValue::Map(raw), &filter, &defs, Usage::Request, &mut sink).unwrap();
    node.validate(&mut sink);
    assert_eq!(sink.violations()[0].kind, ViolationKind::Cast);
    assert_eq!(sink.violations()[0].path.to_string(), "/limit");
}

#[test]
fn test_frozen_registry_rejects_further_definitions() {
    let mut defs = pet_store();
    let err = defs
        .add_schema("Late", Schema::builder(SchemaKind::String).build().unwrap())
        .unwrap_err();
    assert!(matches!(err, DefinitionError::FrozenModification { .. }));
    assert!(defs.schema("Late").is_err());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Validation outcome and sink emptiness always agree.
        #[test]
        fn validate_false_iff_sink_nonempty(n in any::<i64>()) {
            let defs = Definitions::new();
            let schema = Schema::builder(SchemaKind::Integer)
                .validator(Validator::minimum(&json!(0)).unwrap())
                .validator(Validator::maximum(&json!(1000)).unwrap())
                .build()
                .unwrap();
            let node = wrap(Some(json!(n)), &schema, &defs, Usage::Request).unwrap();
            let mut sink = ErrorSink::new();
            let valid = node.validate(&mut sink);
            prop_assert_eq!(valid, sink.is_empty());
            prop_assert_eq!(valid, (0..=1000).contains(&n));
        }

        /// Coercing an integer's decimal rendering recovers the value.
        #[test]
        fn integer_coercion_round_trips(n in any::<i64>()) {
            let defs = Definitions::new();
            let schema = Schema::builder(SchemaKind::Integer).build().unwrap();
            let mut sink = ErrorSink::new();
            let node = coerce(
                DomValue::str(n.to_string()),
                &schema,
                &defs,
                Usage::Request,
                &mut sink,
            ).unwrap();
            prop_assert!(sink.is_empty());
            prop_assert_eq!(node.value(), Value::from(n));
        }
    }
}
