use std::fmt::Write as _;

use hookgate_core::{group_by_category, Decision, SyncReport};

/// Headline paragraph followed by one block per finding category, in
/// registration order:
///
/// ```text
/// Human confirmation required: ...
///
/// [privacy]
/// - MEDIUM Social security number literal (ssn-literal)
/// ```
pub fn render_reason(decision: &Decision) -> String {
    let mut out = decision.reason.clone();
    for group in group_by_category(&decision.findings) {
        let _ = write!(out, "\n\n[{}]", group.category);
        for f in &group.findings {
            let _ = write!(out, "\n- {} {} ({})", f.severity, f.message, f.rule_id);
        }
    }
    out
}

/// One line per completed step, then the failures.
pub fn render_sync_report(headline: &str, report: &SyncReport) -> String {
    let mut out = headline.to_string();
    if !report.notified_roles.is_empty() {
        let _ = write!(out, "\nNotified: {}", report.notified_roles.join(", "));
    }
    if report.is_degraded() {
        out.push_str("\nCoordination sync degraded:");
        for failure in &report.failures {
            let _ = write!(out, "\n- {}: {}", failure.step.as_str(), failure.error);
        }
    }
    out
}
