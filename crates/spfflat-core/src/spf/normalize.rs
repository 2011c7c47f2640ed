//! SPF record normalization and mechanism extraction.
//!
//! Normalization produces a canonical form for comparison: `v=spf1`
//! first, unknown tokens preserved in place, mechanisms sorted
//! lexicographically, and the terminal `all` qualifier last (defaulting
//! to `~all` when absent).

use std::collections::HashSet;

use crate::error::CoreError;

const SPF_VERSION: &str = "v=spf1";

/// Terminal `all` with any qualifier (bare `all` is `+all`).
pub(crate) fn is_terminal_all(token: &str) -> bool {
    matches!(token, "all" | "~all" | "-all" | "+all" | "?all")
}

/// Recognize an SPF mechanism or modifier token. A leading qualifier
/// character is allowed on mechanisms per RFC 7208 §4.6.1.
fn is_mechanism(token: &str) -> bool {
    let body = token.strip_prefix(['+', '-', '~', '?']).unwrap_or(token);
    body == "a"
        || body == "mx"
        || body == "ptr"
        || body.starts_with("a:")
        || body.starts_with("mx:")
        || body.starts_with("ptr:")
        || body.starts_with("a/")
        || body.starts_with("mx/")
        || body.starts_with("include:")
        || body.starts_with("ip4:")
        || body.starts_with("ip6:")
        || body.starts_with("exists:")
        || body.starts_with("redirect=")
        || body.starts_with("exp=")
}

/// Canonicalize an SPF record for comparison.
///
/// Records not starting with `v=spf1` are a hard error.
pub fn normalize(record: &str) -> Result<String, CoreError> {
    if !record.starts_with(SPF_VERSION) {
        return Err(CoreError::InvalidSpf("must start with v=spf1".into()));
    }
    let parts: Vec<&str> = record.split_whitespace().collect();
    if parts.is_empty() {
        return Err(CoreError::InvalidSpf("empty SPF record".into()));
    }

    let mut normalized: Vec<&str> = vec![parts[0]];
    let mut mechanisms: Vec<&str> = Vec::new();
    let mut all_token = None;

    for part in &parts[1..] {
        if is_terminal_all(part) {
            all_token = Some(*part);
        } else if is_mechanism(part) {
            mechanisms.push(part);
        } else {
            // Unknown tokens are kept, in encounter order, but not sorted.
            normalized.push(part);
        }
    }

    mechanisms.sort_unstable();
    normalized.extend(mechanisms);
    normalized.push(all_token.unwrap_or("~all"));

    Ok(normalized.join(" "))
}

/// Sorted mechanisms of a record, excluding `v=spf1` and the terminal
/// `all`.
pub fn extract_mechanisms(record: &str) -> Result<Vec<String>, CoreError> {
    if !record.starts_with(SPF_VERSION) {
        return Err(CoreError::InvalidSpf("must start with v=spf1".into()));
    }
    let mut mechanisms: Vec<String> = record
        .split_whitespace()
        .skip(1)
        .filter(|part| !is_terminal_all(part) && is_mechanism(part))
        .map(String::from)
        .collect();
    mechanisms.sort_unstable();
    Ok(mechanisms)
}

/// Mechanism set of a record, terminal `all` included. Used for the
/// added/removed change summary; order and duplicates are irrelevant.
pub fn mechanism_set(record: &str) -> HashSet<String> {
    record
        .split_whitespace()
        .skip(1)
        .filter(|part| is_terminal_all(part) || is_mechanism(part))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_mechanisms_and_keeps_all_last() {
        let normalized = normalize("v=spf1 mx a include:_spf.google.com ~all").unwrap();
        assert_eq!(normalized, "v=spf1 a include:_spf.google.com mx ~all");
    }

    #[test]
    fn missing_all_defaults_to_softfail() {
        let normalized = normalize("v=spf1 ip4:192.0.2.1").unwrap();
        assert_eq!(normalized, "v=spf1 ip4:192.0.2.1 ~all");
    }

    #[test]
    fn strict_all_is_preserved_verbatim() {
        let normalized = normalize("v=spf1 ip4:192.0.2.1 -all").unwrap();
        assert_eq!(normalized, "v=spf1 ip4:192.0.2.1 -all");
    }

    #[test]
    fn unknown_tokens_stay_in_place_unsorted() {
        let normalized = normalize("v=spf1 zz=1 ip4:192.0.2.9 aa=2 ~all").unwrap();
        assert_eq!(normalized, "v=spf1 zz=1 aa=2 ip4:192.0.2.9 ~all");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "v=spf1 mx a ip6:2001:db8::1 include:x.example -all",
            "v=spf1",
            "v=spf1 foo=bar ip4:10.0.0.1",
        ];
        for input in inputs {
            let once = normalize(input).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {input}");
        }
    }

    #[test]
    fn rejects_non_spf_records() {
        assert!(normalize("spf1 a ~all").is_err());
        assert!(normalize("").is_err());
    }

    #[test]
    fn extract_mechanisms_skips_all() {
        let mechanisms = extract_mechanisms("v=spf1 mx ip4:192.0.2.1 a ~all").unwrap();
        assert_eq!(mechanisms, vec!["a", "ip4:192.0.2.1", "mx"]);
    }

    #[test]
    fn mechanism_set_includes_terminal() {
        let set = mechanism_set("v=spf1 ip4:192.0.2.1 ip4:192.0.2.1 ~all");
        assert_eq!(set.len(), 2);
        assert!(set.contains("~all"));
        assert!(set.contains("ip4:192.0.2.1"));
    }

    #[test]
    fn qualified_mechanisms_are_recognized() {
        let normalized = normalize("v=spf1 -include:bad.example ip4:192.0.2.1 ~all").unwrap();
        assert_eq!(normalized, "v=spf1 -include:bad.example ip4:192.0.2.1 ~all");
    }
}
