//! # Attribute Container — Build, Then Freeze
//!
//! `Attrs` is the typed attribute storage handed to application code
//! after validation: a named mapping with two lifecycle phases. While
//! open it accepts writes; [`Attrs::freeze`] closes it recursively and
//! idempotently, after which any write fails with a frozen-modification
//! error. Structural identity is fixed at freeze time.
//!
//! Freezing materializes a sorted view of the attribute names; the
//! cache is invalidated whenever the backing mapping changes before
//! the freeze.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::DefinitionError;

static NULL_ATTR: AttrValue = AttrValue::Scalar(Value::Null);

/// The shape of one stored attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A plain JSON scalar or collection.
    Scalar(Value),
    /// A nested attribute container.
    Model(Attrs),
    /// A string-keyed mapping of attribute values.
    Map(IndexMap<String, AttrValue>),
}

impl AttrValue {
    /// Recursively freeze nested containers.
    fn freeze(&mut self) {
        match self {
            AttrValue::Scalar(_) => {}
            AttrValue::Model(attrs) => attrs.freeze(),
            AttrValue::Map(map) => {
                for value in map.values_mut() {
                    value.freeze();
                }
            }
        }
    }

    /// The plain JSON view of this attribute.
    pub fn as_value(&self) -> Value {
        match self {
            AttrValue::Scalar(v) => v.clone(),
            AttrValue::Model(attrs) => attrs.to_value(),
            AttrValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.as_value()))
                    .collect(),
            ),
        }
    }
}

/// A typed attribute container with a build-then-freeze lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    entries: IndexMap<String, AttrValue>,
    defaults: IndexMap<String, AttrValue>,
    sorted: Option<Vec<String>>,
    frozen: bool,
}

impl Attrs {
    /// An empty, open container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the default returned by [`Attrs::get`] for an unset name.
    pub fn declare_default(
        &mut self,
        name: impl Into<String>,
        value: AttrValue,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.defaults.insert(name.into(), value);
        Ok(())
    }

    /// Set an attribute. Fails once the container is frozen.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: AttrValue,
    ) -> Result<(), DefinitionError> {
        self.ensure_open()?;
        self.entries.insert(name.into(), value);
        // Reassignment invalidates any derived view built earlier.
        self.sorted = None;
        Ok(())
    }

    /// Get an attribute. Always succeeds: unset names fall back to the
    /// declared default, then to a null scalar.
    pub fn get(&self, name: &str) -> &AttrValue {
        self.entries
            .get(name)
            .or_else(|| self.defaults.get(name))
            .unwrap_or(&NULL_ATTR)
    }

    /// Whether the name was explicitly set (defaults do not count).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of explicitly set attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attributes were explicitly set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate explicitly set attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attribute names sorted lexicographically.
    ///
    /// After freezing this reads from the materialized cache.
    pub fn sorted_names(&self) -> Vec<&str> {
        match &self.sorted {
            Some(cache) => cache.iter().map(|s| s.as_str()).collect(),
            None => {
                let mut names: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
                names.sort_unstable();
                names
            }
        }
    }

    /// Close the container. Idempotent; recursively freezes nested
    /// models and maps and materializes the sorted-name cache.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        for value in self.entries.values_mut() {
            value.freeze();
        }
        for value in self.defaults.values_mut() {
            value.freeze();
        }
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort_unstable();
        self.sorted = Some(names);
        self.frozen = true;
    }

    /// Whether the container has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The plain JSON view of all explicitly set attributes.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.as_value()))
                .collect(),
        )
    }

    fn ensure_open(&self) -> Result<(), DefinitionError> {
        if self.frozen {
            Err(DefinitionError::FrozenModification {
                target: "attribute container".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut attrs = Attrs::new();
        attrs.set("name", AttrValue::Scalar(json!("widget"))).unwrap();
        assert_eq!(attrs.get("name"), &AttrValue::Scalar(json!("widget")));
        assert!(attrs.contains("name"));
    }

    #[test]
    fn test_get_unset_returns_null_scalar() {
        let attrs = Attrs::new();
        assert_eq!(attrs.get("missing"), &AttrValue::Scalar(Value::Null));
    }

    #[test]
    fn test_get_unset_returns_declared_default() {
        let mut attrs = Attrs::new();
        attrs
            .declare_default("limit", AttrValue::Scalar(json!(25)))
            .unwrap();
        assert_eq!(attrs.get("limit"), &AttrValue::Scalar(json!(25)));
        // An explicit set wins over the default.
        attrs.set("limit", AttrValue::Scalar(json!(50))).unwrap();
        assert_eq!(attrs.get("limit"), &AttrValue::Scalar(json!(50)));
    }

    #[test]
    fn test_set_after_freeze_fails_and_state_unchanged() {
        let mut attrs = Attrs::new();
        attrs.set("a", AttrValue::Scalar(json!(1))).unwrap();
        attrs.freeze();
        let err = attrs.set("b", AttrValue::Scalar(json!(2))).unwrap_err();
        assert!(matches!(err, DefinitionError::FrozenModification { .. }));
        assert!(!attrs.contains("b"));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_freeze_is_idempotent() {
        let mut attrs = Attrs::new();
        attrs.set("a", AttrValue::Scalar(json!(1))).unwrap();
        attrs.freeze();
        attrs.freeze();
        assert!(attrs.is_frozen());
    }

    #[test]
    fn test_freeze_recurses_into_models_and_maps() {
        let mut inner = Attrs::new();
        inner.set("deep", AttrValue::Scalar(json!(true))).unwrap();

        let mut mapped = Attrs::new();
        mapped.set("x", AttrValue::Scalar(json!(1))).unwrap();
        let mut map = IndexMap::new();
        map.insert("entry".to_string(), AttrValue::Model(mapped));

        let mut attrs = Attrs::new();
        attrs.set("nested", AttrValue::Model(inner)).unwrap();
        attrs.set("mapping", AttrValue::Map(map)).unwrap();
        attrs.freeze();

        match attrs.get("nested") {
            AttrValue::Model(m) => assert!(m.is_frozen()),
            other => panic!("expected model, got {other:?}"),
        }
        match attrs.get("mapping") {
            AttrValue::Map(m) => match &m["entry"] {
                AttrValue::Model(inner) => assert!(inner.is_frozen()),
                other => panic!("expected model, got {other:?}"),
            },
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn test_sorted_names_cache_matches_recompute() {
        let mut attrs = Attrs::new();
        attrs.set("zeta", AttrValue::Scalar(json!(1))).unwrap();
        attrs.set("alpha", AttrValue::Scalar(json!(2))).unwrap();
        let before = attrs.sorted_names();
        assert_eq!(before, vec!["alpha", "zeta"]);
        // Reassignment before freezing must not leave a stale view.
        attrs.set("beta", AttrValue::Scalar(json!(3))).unwrap();
        attrs.freeze();
        assert_eq!(attrs.sorted_names(), vec!["alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_to_value_round_trip() {
        let mut attrs = Attrs::new();
        attrs.set("name", AttrValue::Scalar(json!("a"))).unwrap();
        let mut inner = Attrs::new();
        inner.set("n", AttrValue::Scalar(json!(1))).unwrap();
        attrs.set("child", AttrValue::Model(inner)).unwrap();
        assert_eq!(attrs.to_value(), json!({"name": "a", "child": {"n": 1}}));
    }
}
