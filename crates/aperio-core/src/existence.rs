//! # Existence Policy — When Absence Is Acceptable
//!
//! Every schema carries an [`Existence`] policy deciding whether an
//! absent, null, or empty value passes before any validators run. The
//! policies form a strictness ladder: `None < AllowNil < AllowEmpty <
//! Present`. The default is `Present` (required, not null, not empty).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a candidate value presented itself to the existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// No value was supplied at all.
    Absent,
    /// An explicit null.
    Null,
    /// A non-null value that is empty (empty string, array, or object).
    Empty,
    /// A non-null, non-empty value.
    Filled,
}

impl Presence {
    /// Classify an optional raw value.
    pub fn of(candidate: Option<&Value>) -> Presence {
        match candidate {
            None => Presence::Absent,
            Some(Value::Null) => Presence::Null,
            Some(Value::String(s)) if s.is_empty() => Presence::Empty,
            Some(Value::Array(a)) if a.is_empty() => Presence::Empty,
            Some(Value::Object(o)) if o.is_empty() => Presence::Empty,
            Some(_) => Presence::Filled,
        }
    }
}

/// The existence policy ladder, ordered by strictness.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Existence {
    /// The value tree is not required at all.
    None = 0,
    /// Null (or absent) is acceptable; an empty non-null value is not.
    AllowNil = 1,
    /// An empty non-null value is acceptable; null (or absent) is not.
    AllowEmpty = 2,
    /// The value must be present, non-null, and non-empty.
    #[default]
    Present = 3,
}

impl Existence {
    /// Whether a value in the given presence state satisfies this policy.
    pub fn admits(&self, presence: Presence) -> bool {
        match self {
            Existence::None => true,
            Existence::AllowNil => !matches!(presence, Presence::Empty),
            Existence::AllowEmpty => matches!(presence, Presence::Empty | Presence::Filled),
            Existence::Present => matches!(presence, Presence::Filled),
        }
    }

    /// Whether the candidate value satisfies this policy.
    pub fn reached(&self, candidate: Option<&Value>) -> bool {
        self.admits(Presence::of(candidate))
    }

    /// Whether this policy tolerates an explicit null.
    pub fn accepts_null(&self) -> bool {
        matches!(self, Existence::None | Existence::AllowNil)
    }

    /// The snake_case identifier for this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Existence::None => "none",
            Existence::AllowNil => "allow_nil",
            Existence::AllowEmpty => "allow_empty",
            Existence::Present => "present",
        }
    }
}

impl std::fmt::Display for Existence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strictness_ordering() {
        assert!(Existence::None < Existence::AllowNil);
        assert!(Existence::AllowNil < Existence::AllowEmpty);
        assert!(Existence::AllowEmpty < Existence::Present);
    }

    #[test]
    fn test_none_always_passes() {
        assert!(Existence::None.reached(None));
        assert!(Existence::None.reached(Some(&Value::Null)));
        assert!(Existence::None.reached(Some(&json!(""))));
        assert!(Existence::None.reached(Some(&json!(42))));
    }

    #[test]
    fn test_allow_nil_accepts_null_rejects_empty() {
        assert!(Existence::AllowNil.reached(Some(&Value::Null)));
        assert!(Existence::AllowNil.reached(None));
        assert!(!Existence::AllowNil.reached(Some(&json!(""))));
        assert!(!Existence::AllowNil.reached(Some(&json!([]))));
        assert!(Existence::AllowNil.reached(Some(&json!("x"))));
    }

    #[test]
    fn test_allow_empty_accepts_empty_rejects_null() {
        assert!(Existence::AllowEmpty.reached(Some(&json!(""))));
        assert!(Existence::AllowEmpty.reached(Some(&json!([]))));
        assert!(Existence::AllowEmpty.reached(Some(&json!({}))));
        assert!(!Existence::AllowEmpty.reached(Some(&Value::Null)));
        assert!(!Existence::AllowEmpty.reached(None));
        assert!(Existence::AllowEmpty.reached(Some(&json!(0))));
    }

    #[test]
    fn test_present_rejects_null_and_empty() {
        assert!(!Existence::Present.reached(Some(&Value::Null)));
        assert!(!Existence::Present.reached(Some(&json!(""))));
        assert!(!Existence::Present.reached(None));
        assert!(Existence::Present.reached(Some(&json!("value"))));
        assert!(Existence::Present.reached(Some(&json!(false))));
        assert!(Existence::Present.reached(Some(&json!(0))));
    }

    #[test]
    fn test_default_is_present() {
        assert_eq!(Existence::default(), Existence::Present);
    }

    #[test]
    fn test_presence_classification() {
        assert_eq!(Presence::of(None), Presence::Absent);
        assert_eq!(Presence::of(Some(&Value::Null)), Presence::Null);
        assert_eq!(Presence::of(Some(&json!(""))), Presence::Empty);
        assert_eq!(Presence::of(Some(&json!("a"))), Presence::Filled);
        assert_eq!(Presence::of(Some(&json!([1]))), Presence::Filled);
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Existence::AllowNil).unwrap(),
            "\"allow_nil\""
        );
        let parsed: Existence = serde_json::from_str("\"present\"").unwrap();
        assert_eq!(parsed, Existence::Present);
    }
}
