//! # Media-Type Selection
//!
//! When a request body declares several content types, a concrete
//! incoming media type selects one deterministically: exact match
//! first, then wildcard matches by specificity (`application/*` beats
//! `*/*`), then the first-declared entry as the fallback.
//!
//! Comparison is case-insensitive and ignores media-type parameters,
//! so `Application/JSON; charset=utf-8` matches `application/json`.

/// Strip parameters and lowercase a media type for comparison.
fn normalize(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Wildcard specificity: higher is more specific, `None` for non-wildcards.
fn wildcard_rank(declared: &str) -> Option<u8> {
    if declared == "*/*" {
        Some(0)
    } else if declared.ends_with("/*") {
        Some(1)
    } else {
        None
    }
}

fn wildcard_covers(declared: &str, concrete: &str) -> bool {
    if declared == "*/*" {
        return true;
    }
    match declared.strip_suffix("/*") {
        Some(prefix) => concrete
            .split('/')
            .next()
            .is_some_and(|major| major == prefix),
        None => false,
    }
}

/// Select the declared media type best matching the concrete one.
///
/// Returns `None` only when nothing was declared.
pub fn best_match<'a, I>(declared: I, concrete: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let concrete = normalize(concrete);
    let mut first: Option<&'a str> = None;
    let mut wildcard: Option<(&'a str, u8)> = None;

    for candidate in declared {
        if first.is_none() {
            first = Some(candidate);
        }
        let normalized = normalize(candidate);
        if normalized == concrete {
            return Some(candidate);
        }
        if let Some(rank) = wildcard_rank(&normalized) {
            if wildcard_covers(&normalized, &concrete)
                && wildcard.map_or(true, |(_, best)| rank > best)
            {
                wildcard = Some((candidate, rank));
            }
        }
    }

    wildcard.map(|(candidate, _)| candidate).or(first)
}
