use std::path::Path;

use hookgate_core::time::{format_timestamp, parse_timestamp};
use hookgate_core::{ActorId, AlertRecord, ProgressRecord};
use hookgate_ledger::{AlertList, Coordination, LedgerError, ProgressBoard};
use tracing::warn;

use crate::document::{block, Block, Document};
use crate::escape::{escape_item, escape_name, escape_text, unescape};

pub const CONTEXT_SECTION: &str = "Project Context";
pub const COORDINATION_SECTION: &str = "Agent Coordination";
pub const COORDINATION_MARKER: &str = "<!-- Inter-agent dependencies and communication -->";
pub const STATUS_SECTION: &str = "Current Status";
pub const STATUS_MARKER: &str = "<!-- Active work streams and progress -->";
pub const CONTAINERIZATION_SECTION: &str = "Containerization Status";

const PROGRESS_PREFIX: &str = "Latest Progress: ";
const ALERT_PREFIX: &str = "Review Required: ";

pub fn template() -> String {
    format!(
        "# Orchestration Index\n\nThis file coordinates multi-agent development activities and tracks project progress.\n\n\
         ## {CONTEXT_SECTION}\n<!-- Project overview and requirements -->\n\n\
         ## {COORDINATION_SECTION}\n{COORDINATION_MARKER}\n\n\
         ## {STATUS_SECTION}\n{STATUS_MARKER}\n\n\
         ## {CONTAINERIZATION_SECTION}\n<!-- Docker and deployment readiness -->\n"
    )
}

fn ticked(items: &[String]) -> String {
    items.iter().map(|i| format!("`{}`", escape_item(i))).collect::<Vec<_>>().join(", ")
}

fn listed(items: &[String]) -> String {
    items.iter().map(|i| escape_name(i)).collect::<Vec<_>>().join(", ")
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|i| i.trim().trim_matches('`'))
        .filter(|i| !i.is_empty())
        .map(unescape)
        .collect()
}

/// `Latest Progress: actor / topic (timestamp)`
fn progress_block(r: &ProgressRecord) -> Block {
    block(
        format!(
            "{PROGRESS_PREFIX}{} / {} ({})",
            escape_name(r.actor.as_str()),
            escape_name(&r.topic),
            format_timestamp(&r.updated_at)
        ),
        &[
            ("Operation", escape_text(&r.operation)),
            ("File", format!("`{}`", escape_text(&r.resource))),
            ("Status", escape_text(&r.status)),
        ],
    )
}

fn parse_progress(b: &Block) -> Option<ProgressRecord> {
    let rest = b.header.strip_prefix(PROGRESS_PREFIX)?;
    let (key, ts) = rest.rsplit_once(" (")?;
    let (actor, topic) = key.split_once(" / ")?;
    Some(ProgressRecord {
        actor: ActorId::new(unescape(actor.trim())),
        topic: unescape(topic.trim()),
        operation: unescape(b.field("Operation")?),
        resource: unescape(b.field("File")?.trim_matches('`')),
        status: unescape(b.field("Status")?),
        updated_at: parse_timestamp(ts.strip_suffix(')')?)?,
    })
}

fn alert_block(a: &AlertRecord) -> Block {
    block(
        format!("{ALERT_PREFIX}{} ({})", escape_name(&a.topic), format_timestamp(&a.raised_at)),
        &[
            ("Requested by", escape_text(a.requested_by.as_str())),
            ("Roles", listed(&a.roles)),
            ("Files", ticked(&a.resources)),
            ("Status", "PENDING".to_string()),
        ],
    )
}

fn parse_alert(b: &Block) -> Option<AlertRecord> {
    let rest = b.header.strip_prefix(ALERT_PREFIX)?;
    let (topic, ts) = rest.rsplit_once(" (")?;
    Some(AlertRecord {
        topic: unescape(topic.trim()),
        requested_by: ActorId::new(unescape(b.field("Requested by")?)),
        roles: split_list(b.field("Roles").unwrap_or("")),
        resources: split_list(b.field("Files").unwrap_or("")),
        raised_at: parse_timestamp(ts.strip_suffix(')')?)?,
    })
}

/// Blocks in `heading` whose header starts with `prefix` are owned and
/// decoded; any other block in the section is kept as written.
fn owned_blocks<T>(
    doc: &Document,
    heading: &str,
    prefix: &str,
    parse: impl Fn(&Block) -> Option<T>,
    path: &Path,
) -> (Vec<T>, Vec<Block>) {
    let mut owned = Vec::new();
    let mut foreign = Vec::new();
    if let Some(section) = doc.section(heading) {
        for b in section.blocks() {
            if !b.header.starts_with(prefix) {
                foreign.push(b);
                continue;
            }
            match parse(&b) {
                Some(v) => owned.push(v),
                None => warn!(path = %path.display(), line = b.line, "skipping unreadable ledger block"),
            }
        }
    }
    (owned, foreign)
}

pub fn decode(text: &str, path: &Path) -> Result<(Document, Coordination), LedgerError> {
    let doc = Document::parse(text);
    let (progress, _) = owned_blocks(&doc, STATUS_SECTION, PROGRESS_PREFIX, parse_progress, path);
    let (alerts, _) = owned_blocks(&doc, COORDINATION_SECTION, ALERT_PREFIX, parse_alert, path);
    Ok((
        doc,
        Coordination {
            progress: ProgressBoard::from_records(progress),
            alerts: AlertList::new(alerts),
        },
    ))
}

pub fn encode(mut doc: Document, state: &Coordination, path: &Path) -> String {
    let (_, foreign) = owned_blocks(&doc, STATUS_SECTION, PROGRESS_PREFIX, parse_progress, path);
    let mut blocks = foreign;
    blocks.extend(state.progress.records().iter().map(progress_block));
    let section = doc.section_mut(STATUS_SECTION, STATUS_MARKER);
    let intro = section.intro();
    section.set_body(intro, &blocks);

    let (_, foreign) = owned_blocks(&doc, COORDINATION_SECTION, ALERT_PREFIX, parse_alert, path);
    let mut blocks = foreign;
    blocks.extend(state.alerts.alerts().iter().map(alert_block));
    let section = doc.section_mut(COORDINATION_SECTION, COORDINATION_MARKER);
    let intro = section.intro();
    section.set_body(intro, &blocks);

    doc.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn p() -> &'static Path {
        Path::new("orchestration-index.md")
    }

    fn progress(actor: &str, status: &str) -> ProgressRecord {
        ProgressRecord {
            actor: ActorId::new(actor),
            topic: "progress".into(),
            operation: "write".into(),
            resource: "api/server.py".into(),
            status: status.into(),
            updated_at: Utc.with_ymd_and_hms(2026, 4, 4, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn progress_block_is_replaced_not_appended() {
        let (doc, mut state) = decode(&template(), p()).unwrap();
        state.progress.update(progress("x", "active"));
        let text = encode(doc, &state, p());

        let (doc, mut state) = decode(&text, p()).unwrap();
        state.progress.update(progress("x", "completed"));
        let text = encode(doc, &state, p());

        assert_eq!(text.matches("### Latest Progress: x / progress").count(), 1);
        assert!(text.contains("- **Status**: completed"));
        assert!(!text.contains("- **Status**: active"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn alerts_roundtrip_and_hand_written_blocks_survive() {
        let text = template().replace(
            COORDINATION_MARKER,
            &format!("{COORDINATION_MARKER}\n\n### API contract\n- owner: api-designer"),
        );
        let (doc, mut state) = decode(&text, p()).unwrap();
        state.alerts.raise(AlertRecord {
            topic: "containerization-review".into(),
            requested_by: ActorId::new("python-pro"),
            roles: vec!["docker-expert".into()],
            resources: vec!["a.py".into(), "b.go".into()],
            raised_at: Utc.with_ymd_and_hms(2026, 4, 4, 9, 0, 0).unwrap(),
        });
        let out = encode(doc, &state, p());
        assert!(out.contains("### API contract\n- owner: api-designer"));
        assert!(out.contains("- **Files**: `a.py`, `b.go`"));

        let (_, again) = decode(&out, p()).unwrap();
        assert_eq!(again.alerts, state.alerts);
    }

    #[test]
    fn every_field_with_delimiters_roundtrips() {
        let (doc, mut state) = decode(&template(), p()).unwrap();
        let mut odd = progress("qa (night) / ops", "blocked\n## Notes");
        odd.topic = "review (v2) / api".into();
        odd.operation = "multi`edit`".into();
        odd.resource = "dir/a, b\n## x.py".into();
        state.progress.update(odd);
        state.alerts.raise(AlertRecord {
            topic: "deploy (prod)".into(),
            requested_by: ActorId::new("qa (night)"),
            roles: vec!["docker, expert".into(), "sre/oncall".into()],
            resources: vec!["a,b.py".into(), "new\nline`.go".into()],
            raised_at: Utc.with_ymd_and_hms(2026, 4, 4, 9, 0, 0).unwrap(),
        });
        let out = encode(doc, &state, p());

        let (doc2, again) = decode(&out, p()).unwrap();
        assert_eq!(again.progress, state.progress);
        assert_eq!(again.alerts, state.alerts);
        assert_eq!(doc2.sections.len(), 4, "{out}");
    }
}
