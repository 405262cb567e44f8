//! # Error Types — Definition Defects vs Input Violations
//!
//! Two disjoint error classes run through Aperio:
//!
//! - [`DefinitionError`] — a defect in the API definition itself:
//!   an unresolved reference, an invalid validator argument, mutation of
//!   a frozen registry. These surface as hard `Result` failures at
//!   build or first-use time and are never shown to API consumers.
//! - [`Violation`] — a problem with request input: a blank required
//!   value, a rejected validator, a failed cast. Violations accumulate
//!   in an [`ErrorSink`] so one pass reports every problem in a payload;
//!   the caller decides the user-visible representation.

use thiserror::Error;

use crate::path::AttrPath;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A defect in the API definition. Indicates a programming error in the
/// definition set, not bad request input; never mapped to a 4xx.
#[derive(Error, Debug)]
pub enum DefinitionError {
    /// A named lookup found nothing in the registry.
    #[error("unknown {entity} reference: {name:?}")]
    UnknownReference {
        /// The entity namespace that was searched (e.g., "schema").
        entity: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// A schema kind the engine does not recognize reached dispatch.
    #[error("unrecognized schema kind: {kind}")]
    UnknownKind {
        /// The offending kind name.
        kind: String,
    },

    /// Mutation was attempted after the target was frozen.
    #[error("cannot modify frozen {target}")]
    FrozenModification {
        /// What was being modified.
        target: String,
    },

    /// A construction argument was not applicable to its target.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why the argument was rejected.
        reason: String,
    },

    /// Two discriminator values map to the same variant schema.
    #[error("discriminator {property:?} maps multiple values to variant {variant:?}")]
    DuplicateDiscriminatorMapping {
        /// The discriminator property name.
        property: String,
        /// The variant schema name that was mapped more than once.
        variant: String,
    },

    /// Reference resolution exceeded the recursion bound during a single
    /// wrap call — the definition set contains a reference cycle.
    #[error("reference recursion limit ({depth}) exceeded; cyclic schema references?")]
    RecursionLimit {
        /// The depth at which wrapping gave up.
        depth: usize,
    },

    /// Canonicalization failed while computing a document digest.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// What went wrong with one value in a wrapped tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Existence policy rejected an absent/null/empty value.
    Blank,
    /// The raw value's type does not fit the schema kind.
    Type,
    /// A property appeared that the schema does not allow.
    UnknownProperty,
    /// A discriminator value had no registered variant mapping.
    UnknownVariant,
    /// Coercion could not parse a non-empty raw value.
    Cast,
    /// Value below the declared minimum.
    Minimum,
    /// Value above the declared maximum.
    Maximum,
    /// Value did not match the declared pattern.
    Pattern,
    /// Value shorter than the declared minimum length.
    MinLength,
    /// Value longer than the declared maximum length.
    MaxLength,
    /// Value not in the declared enumeration.
    Enumeration,
    /// Value did not conform to the declared format.
    Format,
}

impl ViolationKind {
    /// The snake_case identifier used in error reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Type => "type",
            Self::UnknownProperty => "unknown_property",
            Self::UnknownVariant => "unknown_variant",
            Self::Cast => "cast",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Pattern => "pattern",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Enumeration => "enumeration",
            Self::Format => "format",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single input violation with structured context.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Path to the violating value in the wrapped tree.
    pub path: AttrPath,
    /// The category of violation.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    /// Construct a violation at the given path.
    pub fn new(path: AttrPath, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_root() {
            write!(f, "  (root): [{}] {}", self.kind, self.message)
        } else {
            write!(f, "  {}: [{}] {}", self.path, self.kind, self.message)
        }
    }
}

/// Accumulates violations across one validation pass.
///
/// The sink is never truncated: validation visits every node and
/// collects every violation before the caller inspects the result.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    violations: Vec<Violation>,
}

impl ErrorSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Number of recorded violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether no violations were recorded.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// All recorded violations, in visit order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes the sink and returns the inner list.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl std::fmt::Display for ErrorSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
