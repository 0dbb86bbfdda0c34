use std::path::Path;

use hookgate_core::time::{format_timestamp, parse_timestamp};
use hookgate_core::{ActivityRecord, ActivityStatus, ActorId, LockRecord};
use hookgate_ledger::{ActivityLog, LedgerError, LockTable, WorkStatus};
use tracing::warn;

use crate::document::{block, Document};
use crate::escape::{escape_name, escape_text, unescape};

pub const LOCKS_SECTION: &str = "File Locks";
pub const LOCKS_MARKER: &str = "<!-- Active file locks will be listed here -->";
pub const ACTIVITY_SECTION: &str = "Recent Activities";
pub const ACTIVITY_MARKER: &str = "<!-- Agent activities will be logged here -->";
pub const TRUNCATION_MARKER: &str = "<!-- Older activities trimmed -->";

const LOCK_PREFIX: &str = "LOCKED: `";

pub fn template() -> String {
    format!(
        "# Work Status\n\nThis file tracks agent activities and file locks to prevent conflicts.\n\n## {LOCKS_SECTION}\n{LOCKS_MARKER}\n\n## {ACTIVITY_SECTION}\n{ACTIVITY_MARKER}\n"
    )
}

/// `LOCKED: `path` by holder (purpose) at 2026-01-01 00:00:00 UTC`
///
/// The path is escaped so it cannot close the backtick span or the line;
/// holder and purpose so they cannot contain the ` (` delimiter.
pub fn render_lock(r: &LockRecord) -> String {
    format!(
        "{LOCK_PREFIX}{}` by {} ({}) at {}",
        escape_text(&r.resource),
        escape_name(r.holder.as_str()),
        escape_name(&r.purpose),
        format_timestamp(&r.acquired_at)
    )
}

pub fn parse_lock(line: &str) -> Option<LockRecord> {
    let rest = line.trim().strip_prefix(LOCK_PREFIX)?;
    let (resource, rest) = rest.split_once("` by ")?;
    let (head, ts) = rest.rsplit_once(" at ")?;
    let (holder, purpose) = head.rsplit_once(" (")?;
    let purpose = purpose.strip_suffix(')')?;
    Some(LockRecord {
        resource: unescape(resource),
        holder: ActorId::new(unescape(holder.trim())),
        purpose: unescape(purpose),
        acquired_at: parse_timestamp(ts)?,
    })
}

fn activity_header(r: &ActivityRecord) -> String {
    format!("{} - {}", format_timestamp(&r.at), escape_name(&r.operation).to_uppercase())
}

fn strip_ticks(s: &str) -> &str {
    s.trim().trim_start_matches('`').trim_end_matches('`')
}

/// Decode the document. A `LOCKED:` line that cannot be parsed is an error:
/// dropping it would silently free a resource. Unreadable activity entries
/// are skipped.
pub fn decode(text: &str, path: &Path) -> Result<(Document, WorkStatus), LedgerError> {
    let doc = Document::parse(text);
    let mut locks = Vec::new();
    if let Some(section) = doc.section(LOCKS_SECTION) {
        for (i, line) in section.body.iter().enumerate() {
            if !line.trim_start().starts_with("LOCKED:") {
                continue;
            }
            let record = parse_lock(line).ok_or_else(|| LedgerError::Corrupt {
                path: path.to_path_buf(),
                line: section.first_line + i,
                message: format!("unreadable lock entry `{}`", line.trim()),
            })?;
            locks.push(record);
        }
    }

    let mut entries = Vec::new();
    let mut truncated = false;
    if let Some(section) = doc.section(ACTIVITY_SECTION) {
        truncated = section.body.iter().any(|l| l.trim() == TRUNCATION_MARKER);
        for b in section.blocks() {
            let parsed = (|| {
                let (ts, op) = b.header.split_once(" - ")?;
                Some(ActivityRecord {
                    at: parse_timestamp(ts)?,
                    actor: ActorId::new(unescape(b.field("Agent")?)),
                    operation: unescape(&op.trim().to_lowercase()),
                    resource: unescape(strip_ticks(b.field("File")?)),
                    status: ActivityStatus::parse(b.field("Status")?)?,
                    details: b.field("Details").filter(|d| !d.is_empty()).map(unescape),
                })
            })();
            match parsed {
                Some(r) => entries.push(r),
                None => warn!(path = %path.display(), line = b.line, "skipping unreadable activity entry"),
            }
        }
    }

    Ok((
        doc,
        WorkStatus {
            locks: LockTable::from_records(locks),
            activity: ActivityLog::new(entries, truncated),
        },
    ))
}

/// Re-render the owned sections into `doc`, leaving everything else alone.
pub fn encode(mut doc: Document, state: &WorkStatus) -> String {
    let locks = doc.section_mut(LOCKS_SECTION, LOCKS_MARKER);
    let mut body: Vec<String> = locks
        .body
        .iter()
        .filter(|l| !l.trim_start().starts_with("LOCKED:") && !l.trim().is_empty())
        .cloned()
        .collect();
    body.extend(state.locks.records().iter().map(render_lock));
    locks.body = body;

    let activity = doc.section_mut(ACTIVITY_SECTION, ACTIVITY_MARKER);
    let mut intro: Vec<String> =
        activity.intro().into_iter().filter(|l| l.trim() != TRUNCATION_MARKER).collect();
    if state.activity.is_truncated() {
        intro.push(TRUNCATION_MARKER.to_string());
    }
    let blocks: Vec<_> = state
        .activity
        .entries()
        .iter()
        .map(|r| {
            let mut fields = vec![
                ("Agent", escape_text(r.actor.as_str())),
                ("File", format!("`{}`", escape_text(&r.resource))),
                ("Status", r.status.as_str().to_string()),
            ];
            if let Some(d) = &r.details {
                fields.push(("Details", escape_text(d)));
            }
            block(activity_header(r), &fields)
        })
        .collect();
    activity.set_body(intro, &blocks);

    doc.render()
}
