use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{category, ids::*, model::*};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPair {
    pub old: String,
    pub new: String,
}

/// One variant per operation kind, each carrying only the fields it needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OperationBody {
    Write { path: String, content: String },
    Edit { path: String, old: String, new: String },
    MultiEdit { path: String, edits: Vec<EditPair> },
    Run { command: String },
    Delegate { prompt: String },
    Other { tool: String },
}

/// A proposed effect on the workspace. Immutable once received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub actor: ActorId,
    pub description: Option<String>,
    pub body: OperationBody,
}

impl Operation {
    pub fn new(actor: ActorId, body: OperationBody) -> Self {
        Self { actor, description: None, body }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> OperationKind {
        match &self.body {
            OperationBody::Write { .. } => OperationKind::Write,
            OperationBody::Edit { .. } => OperationKind::Edit,
            OperationBody::MultiEdit { .. } => OperationKind::MultiEdit,
            OperationBody::Run { .. } => OperationKind::Run,
            OperationBody::Delegate { .. } => OperationKind::Delegate,
            OperationBody::Other { .. } => OperationKind::Other,
        }
    }

    pub fn resource(&self) -> Option<&str> {
        match &self.body {
            OperationBody::Write { path, .. }
            | OperationBody::Edit { path, .. }
            | OperationBody::MultiEdit { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Text the evaluators scan. For edits only the replacement text is new.
    pub fn payload(&self) -> Cow<'_, str> {
        match &self.body {
            OperationBody::Write { content, .. } => Cow::Borrowed(content),
            OperationBody::Edit { new, .. } => Cow::Borrowed(new),
            OperationBody::MultiEdit { edits, .. } => {
                Cow::Owned(edits.iter().map(|e| e.new.as_str()).collect::<Vec<_>>().join("\n"))
            }
            OperationBody::Run { command } => Cow::Borrowed(command),
            OperationBody::Delegate { prompt } => Cow::Borrowed(prompt),
            OperationBody::Other { .. } => Cow::Borrowed(""),
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Whether the gate inspects this operation at all.
    pub fn is_gated(&self) -> bool {
        !matches!(self.body, OperationBody::Other { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub category: String,
    pub severity: RiskLevel,
    pub message: String,
}

impl Finding {
    pub fn new(rule_id: impl Into<String>, category: impl Into<String>, severity: RiskLevel, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            category: category.into(),
            severity,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub resource: String,
    pub holder: ActorId,
    pub purpose: String,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub at: DateTime<Utc>,
    pub actor: ActorId,
    pub operation: String,
    pub resource: String,
    pub status: ActivityStatus,
    pub details: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub actor: ActorId,
    pub topic: String,
    pub operation: String,
    pub resource: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn key(&self) -> (&str, &str) {
        (self.actor.as_str(), self.topic.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub topic: String,
    pub requested_by: ActorId,
    pub roles: Vec<String>,
    pub resources: Vec<String>,
    pub raised_at: DateTime<Utc>,
}

/// The gate's answer for one operation. Computed once, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    /// Machine-readable tag callers branch on.
    pub category: String,
    /// Headline paragraph; the protocol layer appends the grouped findings.
    pub reason: String,
    pub findings: Vec<Finding>,
    pub suppress_output: bool,
    pub conflict: Option<LockRecord>,
}

impl Decision {
    pub fn lock_conflict(record: LockRecord) -> Self {
        Self {
            action: Action::Block,
            category: category::LOCK_CONFLICT.to_string(),
            reason: format!(
                "File conflict: `{}` is locked by {} ({}) since {}. Coordinate with the locking agent or wait for it to finish.",
                record.resource,
                record.holder,
                record.purpose,
                crate::time::format_timestamp(&record.acquired_at),
            ),
            findings: vec![],
            suppress_output: false,
            conflict: Some(record),
        }
    }

    /// Build or deploy work described in a workspace with no container setup.
    pub fn containerization_required(approver: &str) -> Self {
        Self {
            action: Action::Block,
            category: category::CONTAINERIZATION_REQUIRED.to_string(),
            reason: format!(
                "Containerization required: the workspace has no Dockerfile or docker-compose file. \
                 This operation needs containerization approval from {approver}."
            ),
            findings: vec![],
            suppress_output: false,
            conflict: None,
        }
    }

    pub fn not_applicable() -> Self {
        Self {
            action: Action::Allow,
            category: category::NOT_APPLICABLE.to_string(),
            reason: "Operation is not inspected by the gate.".to_string(),
            findings: vec![],
            suppress_output: true,
            conflict: None,
        }
    }

    pub fn is_block(&self) -> bool {
        self.action == Action::Block
    }
}
