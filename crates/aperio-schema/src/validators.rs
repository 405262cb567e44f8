//! # Validators — Composable Value-Level Checks
//!
//! Each validator is constructed with a single control parameter and
//! produces at most one violation per value. A schema stores only the
//! latest validator registered per kind: re-declaring `minimum`
//! replaces the previous bound, it does not stack.
//!
//! Construction validates the control parameter up front — a
//! non-numeric bound or an uncompilable pattern is a definition defect,
//! reported as `InvalidArgument` long before any request arrives.
//! Validators never run against null values; nullness is the existence
//! policy's concern.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use aperio_core::{AttrPath, DefinitionError, Violation, ViolationKind};

/// The kind of a validator; keys the per-schema validator map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidatorKind {
    /// Lower numeric bound.
    Minimum,
    /// Upper numeric bound.
    Maximum,
    /// Regular-expression constraint on strings.
    Pattern,
    /// Lower bound on string characters / array elements.
    MinLength,
    /// Upper bound on string characters / array elements.
    MaxLength,
    /// Closed set of allowed values.
    Enumeration,
    /// Named syntactic format for strings.
    Format,
}

impl ValidatorKind {
    /// The document keyword for this validator kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Pattern => "pattern",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Enumeration => "enum",
            Self::Format => "format",
        }
    }
}

/// Named string formats checked syntactically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFormat {
    /// `YYYY-MM-DD`.
    Date,
    /// RFC 3339 date-time.
    DateTime,
    /// Hyphenated 8-4-4-4-12 hex UUID.
    Uuid,
    /// A plausible email address.
    Email,
}

impl ValueFormat {
    /// The document identifier for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Uuid => "uuid",
            Self::Email => "email",
        }
    }

    fn regex(&self) -> &'static Regex {
        static DATE: OnceLock<Regex> = OnceLock::new();
        static DATE_TIME: OnceLock<Regex> = OnceLock::new();
        static UUID: OnceLock<Regex> = OnceLock::new();
        static EMAIL: OnceLock<Regex> = OnceLock::new();
        match self {
            Self::Date => DATE.get_or_init(|| {
                Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static pattern")
            }),
            Self::DateTime => DATE_TIME.get_or_init(|| {
                Regex::new(r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$")
                    .expect("static pattern")
            }),
            Self::Uuid => UUID.get_or_init(|| {
                Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
                    .expect("static pattern")
            }),
            Self::Email => EMAIL.get_or_init(|| {
                Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static pattern")
            }),
        }
    }

    /// Whether the string conforms to this format.
    pub fn matches(&self, s: &str) -> bool {
        self.regex().is_match(s)
    }
}

impl FromStr for ValueFormat {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "date-time" => Ok(Self::DateTime),
            "uuid" => Ok(Self::Uuid),
            "email" => Ok(Self::Email),
            other => Err(DefinitionError::InvalidArgument {
                reason: format!("unknown format: {other:?}"),
            }),
        }
    }
}

/// A single value-level check with one control parameter.
#[derive(Debug, Clone)]
pub enum Validator {
    /// Value must be `>=` the bound.
    Minimum(f64),
    /// Value must be `<=` the bound.
    Maximum(f64),
    /// String must match the pattern.
    Pattern(Regex),
    /// String character count / array length must be `>=` the bound.
    MinLength(usize),
    /// String character count / array length must be `<=` the bound.
    MaxLength(usize),
    /// Value must be one of the listed values.
    Enumeration(Vec<Value>),
    /// String must conform to the named format.
    Format(ValueFormat),
}

impl Validator {
    /// A `minimum` validator. Fails if the bound does not support
    /// numeric ordering.
    pub fn minimum(bound: &Value) -> Result<Self, DefinitionError> {
        numeric_bound(bound, "minimum").map(Self::Minimum)
    }

    /// A `maximum` validator. Fails if the bound does not support
    /// numeric ordering.
    pub fn maximum(bound: &Value) -> Result<Self, DefinitionError> {
        numeric_bound(bound, "maximum").map(Self::Maximum)
    }

    /// A `pattern` validator. Fails if the expression does not compile.
    pub fn pattern(expr: &str) -> Result<Self, DefinitionError> {
        Regex::new(expr)
            .map(Self::Pattern)
            .map_err(|e| DefinitionError::InvalidArgument {
                reason: format!("pattern {expr:?} does not compile: {e}"),
            })
    }

    /// A `minLength` validator.
    pub fn min_length(bound: usize) -> Self {
        Self::MinLength(bound)
    }

    /// A `maxLength` validator.
    pub fn max_length(bound: usize) -> Self {
        Self::MaxLength(bound)
    }

    /// An `enum` validator. Fails on an empty allowed set.
    pub fn enumeration(allowed: Vec<Value>) -> Result<Self, DefinitionError> {
        if allowed.is_empty() {
            return Err(DefinitionError::InvalidArgument {
                reason: "enumeration requires at least one allowed value".into(),
            });
        }
        Ok(Self::Enumeration(allowed))
    }

    /// A `format` validator. Fails on an unknown format name.
    pub fn format(name: &str) -> Result<Self, DefinitionError> {
        name.parse().map(Self::Format)
    }

    /// This validator's kind.
    pub fn kind(&self) -> ValidatorKind {
        match self {
            Self::Minimum(_) => ValidatorKind::Minimum,
            Self::Maximum(_) => ValidatorKind::Maximum,
            Self::Pattern(_) => ValidatorKind::Pattern,
            Self::MinLength(_) => ValidatorKind::MinLength,
            Self::MaxLength(_) => ValidatorKind::MaxLength,
            Self::Enumeration(_) => ValidatorKind::Enumeration,
            Self::Format(_) => ValidatorKind::Format,
        }
    }

    /// Check a non-null value, producing at most one violation.
    ///
    /// Checks that do not apply to the value's type pass silently; the
    /// wrapping layer reports type mismatches separately.
    pub fn check(&self, value: &Value, path: &AttrPath) -> Option<Violation> {
        match self {
            Self::Minimum(bound) => {
                let n = value.as_f64()?;
                (n < *bound).then(|| {
                    Violation::new(
                        path.clone(),
                        ViolationKind::Minimum,
                        format!("{n} is below the minimum of {bound}"),
                    )
                })
            }
            Self::Maximum(bound) => {
                let n = value.as_f64()?;
                (n > *bound).then(|| {
                    Violation::new(
                        path.clone(),
                        ViolationKind::Maximum,
                        format!("{n} is above the maximum of {bound}"),
                    )
                })
            }
            Self::Pattern(regex) => {
                let s = value.as_str()?;
                (!regex.is_match(s)).then(|| {
                    Violation::new(
                        path.clone(),
                        ViolationKind::Pattern,
                        format!("{s:?} does not match pattern {:?}", regex.as_str()),
                    )
                })
            }
            Self::MinLength(bound) => {
                let len = measured_length(value)?;
                (len < *bound).then(|| {
                    Violation::new(
                        path.clone(),
                        ViolationKind::MinLength,
                        format!("length {len} is below the minimum of {bound}"),
                    )
                })
            }
            Self::MaxLength(bound) => {
                let len = measured_length(value)?;
                (len > *bound).then(|| {
                    Violation::new(
                        path.clone(),
                        ViolationKind::MaxLength,
                        format!("length {len} is above the maximum of {bound}"),
                    )
                })
            }
            Self::Enumeration(allowed) => (!allowed.contains(value)).then(|| {
                Violation::new(
                    path.clone(),
                    ViolationKind::Enumeration,
                    format!("{value} is not one of the allowed values"),
                )
            }),
            Self::Format(format) => {
                let s = value.as_str()?;
                (!format.matches(s)).then(|| {
                    Violation::new(
                        path.clone(),
                        ViolationKind::Format,
                        format!("{s:?} is not a valid {}", format.as_str()),
                    )
                })
            }
        }
    }

    /// The control parameter as a document value (for projection).
    pub fn control_value(&self) -> Value {
        match self {
            Self::Minimum(b) | Self::Maximum(b) => number_value(*b),
            Self::Pattern(r) => Value::String(r.as_str().to_string()),
            Self::MinLength(b) | Self::MaxLength(b) => Value::Number((*b).into()),
            Self::Enumeration(allowed) => Value::Array(allowed.clone()),
            Self::Format(f) => Value::String(f.as_str().to_string()),
        }
    }
}

/// Render an f64 bound as a JSON number, preferring integer form.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn numeric_bound(bound: &Value, keyword: &str) -> Result<f64, DefinitionError> {
    bound.as_f64().ok_or_else(|| DefinitionError::InvalidArgument {
        reason: format!("{keyword} bound {bound} does not support numeric ordering"),
    })
}

/// Character count for strings, element count for arrays.
fn measured_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        _ => None,
    }
}
