//! Text rendering for per-domain flatten reports.

use std::fmt::Write as _;

use spfflat_core::DomainReport;

/// Render one domain's report in the section format shown to users.
pub fn render_domain_report(report: &DomainReport, dry_run: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n===== Processing domain: {} =====\n", report.domain);
    out.push_str("--- SPF Summary ---\n\n");
    let _ = writeln!(
        out,
        "Current Aggregate SPF:\n{}\n",
        report
            .current_aggregate
            .as_deref()
            .unwrap_or("(No valid SPF record found on root)")
    );
    let _ = writeln!(out, "New Flattened Aggregate SPF:\n{}\n", report.flattened);
    let _ = writeln!(out, "Original SPF (unflattened):\n{}\n", report.original);
    let _ = writeln!(
        out,
        "DNS lookups required by the original record: {}{}",
        report.lookup_count,
        if report.was_flattened { "" } else { " (within budget, left unflattened)" }
    );

    out.push_str("\n--- Aggregate SPF Changes ---\n\n");
    let _ = writeln!(out, "{}\n", report.change_summary);

    let planned = report.plan.describe(&report.domain);
    if !planned.is_empty() {
        out.push_str("Planned mutations:\n");
        for line in planned {
            let _ = writeln!(out, "  - {line}");
        }
        out.push('\n');
    }

    if report.changed && !report.desired_records.is_empty() {
        out.push_str("--- DNS TXT Records To Be Added/Changed ---\n\n");
        // Apex first, then continuations in order.
        if let Some(content) = report.desired_records.get(&report.domain) {
            let _ = writeln!(out, "Record: {}\nValue: {}\n", report.domain, content);
        }
        for (name, content) in &report.desired_records {
            if name != &report.domain {
                let _ = writeln!(out, "Record: {name}\nValue: {content}\n");
            }
        }
    }

    if report.applied {
        out.push_str("\nSPF records updated in production mode.\n");
    } else if dry_run && report.changed {
        out.push_str("\nSPF records would be updated in production mode.\n");
    } else {
        out.push_str("\nSPF records are already up to date. No changes needed.\n");
    }

    let _ = writeln!(out, "\n---\n{}\n---", report.attribution);
    out
}

/// Render a failed domain task.
pub fn render_domain_error(domain: &str, error: &impl std::fmt::Display) -> String {
    format!("\n===== Error processing domain: {domain} =====\n\nError: {error}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use spfflat_core::{DomainReport, MutationPlan};
    use std::collections::BTreeMap;

    fn report(changed: bool, applied: bool) -> DomainReport {
        let mut desired = BTreeMap::new();
        if changed {
            desired.insert(
                "example.com".to_string(),
                "v=spf1 ip4:192.0.2.1 ~all".to_string(),
            );
        }
        DomainReport {
            domain: "example.com".into(),
            original: "v=spf1 include:_spf.example.net ~all".into(),
            flattened: "v=spf1 ip4:192.0.2.1 ~all".into(),
            current_aggregate: None,
            lookup_count: 12,
            was_flattened: true,
            changed,
            change_summary: "Added: ip4:192.0.2.1, ~all.".into(),
            desired_records: desired,
            plan: MutationPlan::default(),
            applied,
            attribution: "Data provided by Example, LLC.".into(),
        }
    }

    #[test]
    fn dry_run_report_mentions_pending_update() {
        let text = render_domain_report(&report(true, false), true);
        assert!(text.contains("===== Processing domain: example.com ====="));
        assert!(text.contains("Record: example.com"));
        assert!(text.contains("would be updated in production mode"));
        assert!(text.contains("Data provided by Example, LLC."));
    }

    #[test]
    fn applied_report_confirms_the_update() {
        let text = render_domain_report(&report(true, true), false);
        assert!(text.contains("updated in production mode"));
        assert!(!text.contains("would be updated"));
    }

    #[test]
    fn unchanged_report_skips_record_listing() {
        let text = render_domain_report(&report(false, false), true);
        assert!(text.contains("already up to date"));
        assert!(!text.contains("--- DNS TXT Records To Be Added/Changed ---"));
    }
}
