//! # Document Dialects — Four Revisions, One Total Order
//!
//! The projector targets four revisions of the HTTP API description
//! format. They are totally ordered, so "from version X" and "up to
//! version Y" feature gates are simple comparisons.

use std::str::FromStr;

use aperio_core::DefinitionError;

/// A supported document dialect, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocVersion {
    /// Swagger 2.0.
    Swagger2,
    /// OpenAPI 3.0 (rendered as 3.0.3).
    V3_0,
    /// OpenAPI 3.1 (rendered as 3.1.0).
    V3_1,
    /// OpenAPI 3.2 (rendered as 3.2.0).
    V3_2,
}

impl DocVersion {
    /// All supported dialects, oldest first.
    pub fn all() -> [DocVersion; 4] {
        [Self::Swagger2, Self::V3_0, Self::V3_1, Self::V3_2]
    }

    /// The exact version string rendered into documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swagger2 => "2.0",
            Self::V3_0 => "3.0.3",
            Self::V3_1 => "3.1.0",
            Self::V3_2 => "3.2.0",
        }
    }

    /// Whether parameters carry their type under a `schema` key rather
    /// than inline on the parameter object.
    pub fn wraps_parameter_schema(&self) -> bool {
        *self >= Self::V3_0
    }

    /// Whether reusable entities live under `components`.
    pub fn has_components(&self) -> bool {
        *self >= Self::V3_0
    }

    /// Whether nullability renders as a `["…", "null"]` type array
    /// instead of a `nullable: true` flag.
    pub fn null_as_type_array(&self) -> bool {
        *self >= Self::V3_1
    }

    /// Whether example objects split `value` into `dataValue` and
    /// `serializedValue`.
    pub fn split_example_values(&self) -> bool {
        *self >= Self::V3_2
    }

    /// Whether server and link objects carry a `name` field.
    pub fn named_servers(&self) -> bool {
        *self >= Self::V3_2
    }

    /// The reference prefix for registered schemas.
    pub fn schema_ref_prefix(&self) -> &'static str {
        if self.has_components() {
            "#/components/schemas/"
        } else {
            "#/definitions/"
        }
    }
}

impl std::fmt::Display for DocVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocVersion {
    type Err = DefinitionError;

    /// Parse a dialect identifier; patch digits are optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2.0" => Ok(Self::Swagger2),
            "3.0" | "3.0.3" => Ok(Self::V3_0),
            "3.1" | "3.1.0" => Ok(Self::V3_1),
            "3.2" | "3.2.0" => Ok(Self::V3_2),
            other => Err(DefinitionError::InvalidArgument {
                reason: format!("unsupported document version: {other:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        let all = DocVersion::all();
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_feature_gates() {
        assert!(!DocVersion::Swagger2.wraps_parameter_schema());
        assert!(DocVersion::V3_0.wraps_parameter_schema());
        assert!(!DocVersion::V3_0.null_as_type_array());
        assert!(DocVersion::V3_1.null_as_type_array());
        assert!(!DocVersion::V3_1.split_example_values());
        assert!(DocVersion::V3_2.split_example_values());
        assert!(DocVersion::V3_2.named_servers());
    }

    #[test]
    fn test_parse_and_display() {
        for v in DocVersion::all() {
            let parsed: DocVersion = v.as_str().parse().unwrap();
            assert_eq!(parsed, v);
        }
        assert_eq!("3.1".parse::<DocVersion>().unwrap(), DocVersion::V3_1);
        assert!("4.0".parse::<DocVersion>().is_err());
    }

    #[test]
    fn test_ref_prefix() {
        assert_eq!(DocVersion::Swagger2.schema_ref_prefix(), "#/definitions/");
        assert_eq!(
            DocVersion::V3_1.schema_ref_prefix(),
            "#/components/schemas/"
        );
    }
}
