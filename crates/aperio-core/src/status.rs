//! # Response Status Matching — Code, Range, Default
//!
//! Operations declare responses against a [`Status`]: an exact code
//! (`404`), a hundred-block range (`4xx`), or `default`. Matching a
//! concrete response code prefers the most specific declaration:
//! exact code, then range, then default.

use crate::error::DefinitionError;
use std::str::FromStr;

/// One of the five hundred-block status groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusRange {
    /// 1xx — informational.
    Informational,
    /// 2xx — success.
    Success,
    /// 3xx — redirection.
    Redirection,
    /// 4xx — client error.
    ClientError,
    /// 5xx — server error.
    ServerError,
}

impl StatusRange {
    /// The lower bound of this range (100, 200, ...).
    pub fn hundred(&self) -> u16 {
        match self {
            Self::Informational => 100,
            Self::Success => 200,
            Self::Redirection => 300,
            Self::ClientError => 400,
            Self::ServerError => 500,
        }
    }

    /// Whether the concrete code falls in this hundred-block.
    pub fn contains(&self, code: u16) -> bool {
        code / 100 * 100 == self.hundred()
    }

    /// The document identifier for this range (`"4XX"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "1XX",
            Self::Success => "2XX",
            Self::Redirection => "3XX",
            Self::ClientError => "4XX",
            Self::ServerError => "5XX",
        }
    }
}

/// A declared response status.
///
/// Ordered by match priority, then value: exact codes sort before
/// ranges, ranges before the default. Iterating a sorted declaration
/// list therefore visits the most specific entries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// An exact status code (100–599). Priority 1.
    Code(u16),
    /// A hundred-block range. Priority 2.
    Range(StatusRange),
    /// Matches any code. Priority 3.
    Default,
}

impl Status {
    /// Construct an exact-code status, validating the 100–599 bound.
    pub fn code(code: u16) -> Result<Self, DefinitionError> {
        if (100..=599).contains(&code) {
            Ok(Self::Code(code))
        } else {
            Err(DefinitionError::InvalidArgument {
                reason: format!("status code {code} outside 100..=599"),
            })
        }
    }

    /// Match priority: 1 for exact codes, 2 for ranges, 3 for default.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Code(_) => 1,
            Self::Range(_) => 2,
            Self::Default => 3,
        }
    }

    /// Whether this declaration matches the concrete response code.
    pub fn matches(&self, code: u16) -> bool {
        match self {
            Self::Code(c) => *c == code,
            Self::Range(r) => r.contains(code),
            Self::Default => true,
        }
    }

    /// Select the most specific declaration matching `code`.
    ///
    /// Picks the matching declaration with the smallest priority,
    /// tie-broken by value order.
    pub fn select<'a, I>(declared: I, code: u16) -> Option<&'a Status>
    where
        I: IntoIterator<Item = &'a Status>,
    {
        declared
            .into_iter()
            .filter(|s| s.matches(code))
            .min_by(|a, b| a.cmp(b))
    }

    fn sort_value(&self) -> u16 {
        match self {
            Self::Code(c) => *c,
            Self::Range(r) => r.hundred(),
            Self::Default => 0,
        }
    }
}

impl PartialOrd for Status {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Status {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.priority(), self.sort_value()).cmp(&(other.priority(), other.sort_value()))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(c) => write!(f, "{c}"),
            Self::Range(r) => f.write_str(r.as_str()),
            Self::Default => f.write_str("default"),
        }
    }
}

impl FromStr for Status {
    type Err = DefinitionError;

    /// Parse `"404"`, `"4xx"`/`"4XX"`, or `"default"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("default") {
            return Ok(Self::Default);
        }
        let lowered = s.to_ascii_lowercase();
        let range = match lowered.as_str() {
            "1xx" => Some(StatusRange::Informational),
            "2xx" => Some(StatusRange::Success),
            "3xx" => Some(StatusRange::Redirection),
            "4xx" => Some(StatusRange::ClientError),
            "5xx" => Some(StatusRange::ServerError),
            _ => None,
        };
        if let Some(range) = range {
            return Ok(Self::Range(range));
        }
        let code = s.parse::<u16>().map_err(|_| DefinitionError::InvalidArgument {
            reason: format!("unparsable status declaration: {s:?}"),
        })?;
        Self::code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_bounds() {
        assert!(Status::code(100).is_ok());
        assert!(Status::code(599).is_ok());
        assert!(Status::code(99).is_err());
        assert!(Status::code(600).is_err());
    }

    #[test]
    fn test_matching() {
        assert!(Status::Code(404).matches(404));
        assert!(!Status::Code(404).matches(405));
        assert!(Status::Range(StatusRange::ClientError).matches(409));
        assert!(!Status::Range(StatusRange::ClientError).matches(500));
        assert!(Status::Default.matches(200));
        assert!(Status::Default.matches(599));
    }

    #[test]
    fn test_select_prefers_exact_code() {
        let declared = [
            Status::Default,
            Status::Range(StatusRange::ClientError),
            Status::Code(404),
        ];
        assert_eq!(Status::select(&declared, 404), Some(&Status::Code(404)));
    }

    #[test]
    fn test_select_falls_back_to_range() {
        let declared = [
            Status::Default,
            Status::Range(StatusRange::ClientError),
            Status::Code(404),
        ];
        assert_eq!(
            Status::select(&declared, 409),
            Some(&Status::Range(StatusRange::ClientError))
        );
    }

    #[test]
    fn test_select_falls_back_to_default() {
        let declared = [
            Status::Default,
            Status::Range(StatusRange::ClientError),
            Status::Code(404),
        ];
        assert_eq!(Status::select(&declared, 200), Some(&Status::Default));
    }

    #[test]
    fn test_select_no_match() {
        let declared = [Status::Code(404)];
        assert_eq!(Status::select(&declared, 200), None);
    }

    #[test]
    fn test_ordering_most_specific_first() {
        let mut declared = vec![
            Status::Default,
            Status::Range(StatusRange::ClientError),
            Status::Code(200),
            Status::Code(404),
        ];
        declared.sort();
        assert_eq!(
            declared,
            vec![
                Status::Code(200),
                Status::Code(404),
                Status::Range(StatusRange::ClientError),
                Status::Default,
            ]
        );
    }

    #[test]
    fn test_display_and_parse_roundtrip() {
        for s in [
            Status::Code(418),
            Status::Range(StatusRange::ServerError),
            Status::Default,
        ] {
            let rendered = s.to_string();
            let parsed: Status = rendered.parse().unwrap();
            assert_eq!(s, parsed);
        }
        assert_eq!(Status::Code(404).to_string(), "404");
        assert_eq!(Status::Range(StatusRange::ClientError).to_string(), "4XX");
        assert_eq!(Status::Default.to_string(), "default");
    }

    #[test]
    fn test_parse_lowercase_range() {
        let parsed: Status = "4xx".parse().unwrap();
        assert_eq!(parsed, Status::Range(StatusRange::ClientError));
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!("4x".parse::<Status>().is_err());
        assert!("abc".parse::<Status>().is_err());
        assert!("700".parse::<Status>().is_err());
    }
}
