//! Chained packing of long SPF records into 255-octet TXT segments.
//!
//! A record over the wire limit is split across `spf0.<domain>`,
//! `spf1.<domain>`, ... continuations, each ending in
//! `include:spf<N+1>.<domain> ~all` except the last (`~all`), with the
//! apex reduced to a pointer at `spf0`.

use std::collections::BTreeMap;

/// Maximum number of octets in a single TXT string.
pub const MAX_TXT_LENGTH: usize = 255;

const TERMINAL_TAIL: &str = " ~all";

/// Split `record` into chained TXT records for `domain`.
///
/// Short records come back unchanged under the apex name. Long records
/// are tokenized and greedily packed; while packing segment `i`, space is
/// reserved for the worst-case continuation tail so every emitted record
/// independently satisfies the limit.
pub fn split_and_chain(record: &str, domain: &str) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();

    if record.len() <= MAX_TXT_LENGTH {
        result.insert(domain.to_string(), record.to_string());
        return result;
    }

    // Peel the trailing all-qualifier; chaining re-adds ~all per segment.
    let body = record
        .trim_end_matches(" ~all")
        .trim_end_matches(" -all")
        .trim_end_matches(" +all")
        .trim_end_matches(" ?all");

    let mut tokens = body.split_whitespace();
    let version = tokens.next().unwrap_or("v=spf1");

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::from(version);

    for token in tokens {
        let reserve = continuation_tail(segments.len() + 1, domain).len();
        if current.len() + 1 + token.len() + reserve > MAX_TXT_LENGTH {
            segments.push(current);
            current = String::from(version);
        }
        current.push(' ');
        current.push_str(token);
    }
    segments.push(current);

    let last = segments.len() - 1;
    for (i, mut segment) in segments.into_iter().enumerate() {
        let tail = if i < last {
            continuation_tail(i + 1, domain)
        } else {
            TERMINAL_TAIL.to_string()
        };
        // Safety net; the packing loop reserves enough space already.
        if segment.len() + tail.len() > MAX_TXT_LENGTH {
            segment.truncate(MAX_TXT_LENGTH - tail.len());
        }
        segment.push_str(&tail);
        result.insert(format!("spf{i}.{domain}"), segment);
    }

    result.insert(
        domain.to_string(),
        format!("v=spf1 include:spf0.{domain} ~all"),
    );
    result
}

fn continuation_tail(next: usize, domain: &str) -> String {
    format!(" include:spf{next}.{domain} ~all")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_record_is_returned_unchanged() {
        let records = split_and_chain("v=spf1 ip4:192.0.2.1 ~all", "example.com");
        assert_eq!(records.len(), 1);
        assert_eq!(records["example.com"], "v=spf1 ip4:192.0.2.1 ~all");
    }

    #[test]
    fn long_record_chains_through_continuations() {
        // 50 repeated ip4 mechanisms: far over 255 octets.
        let mechanisms = vec!["ip4:192.0.2.1"; 50].join(" ");
        let record = format!("v=spf1 {mechanisms} ~all");
        let records = split_and_chain(&record, "example.com");

        assert!(records.len() >= 3, "expected apex plus >= 2 continuations");
        assert_eq!(
            records["example.com"],
            "v=spf1 include:spf0.example.com ~all"
        );

        for (name, content) in &records {
            assert!(
                content.len() <= MAX_TXT_LENGTH,
                "{name} exceeds 255 octets: {}",
                content.len()
            );
            assert!(content.starts_with("v=spf1 "), "{name} missing version");
            assert!(content.ends_with(" ~all"), "{name} missing terminal");
        }

        // Every continuation except the last points at its successor.
        let continuations = records.len() - 1;
        for i in 0..continuations {
            let content = &records[&format!("spf{i}.example.com")];
            if i < continuations - 1 {
                assert!(
                    content.ends_with(&format!(" include:spf{}.example.com ~all", i + 1)),
                    "spf{i} does not chain to spf{}",
                    i + 1
                );
            } else {
                assert!(!content.contains("include:spf"));
            }
        }
    }

    #[test]
    fn chain_preserves_every_mechanism() {
        let mechanisms: Vec<String> = (0..40).map(|i| format!("ip4:198.51.100.{i}")).collect();
        let record = format!("v=spf1 {} ~all", mechanisms.join(" "));
        let records = split_and_chain(&record, "example.com");

        let mut found = Vec::new();
        for (name, content) in &records {
            if name == "example.com" {
                continue;
            }
            for token in content.split_whitespace() {
                if token.starts_with("ip4:") {
                    found.push(token.to_string());
                }
            }
        }
        found.sort();
        let mut expected = mechanisms.clone();
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn strict_fail_qualifier_is_peeled_before_packing() {
        let mechanisms = vec!["ip4:192.0.2.1"; 30].join(" ");
        let record = format!("v=spf1 {mechanisms} -all");
        let records = split_and_chain(&record, "example.com");
        for content in records.values() {
            assert!(!content.contains("-all"));
            assert!(content.ends_with(" ~all"));
        }
    }

    #[test]
    fn boundary_record_at_exactly_255_is_not_split() {
        let mut record = String::from("v=spf1");
        while record.len() + " ip4:203.0.113.99".len() <= MAX_TXT_LENGTH - TERMINAL_TAIL.len() {
            record.push_str(" ip4:203.0.113.99");
        }
        record.push_str(TERMINAL_TAIL);
        assert!(record.len() <= MAX_TXT_LENGTH);
        let records = split_and_chain(&record, "example.com");
        assert_eq!(records.len(), 1);
    }
}
