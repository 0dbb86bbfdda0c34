use serde::{Deserialize, Serialize};

/// Risk lattice: `None < Low < Medium < High`, combined by [`RiskLevel::join`].
///
/// Declaration order is the lattice order; `Ord` is derived from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const BOTTOM: RiskLevel = RiskLevel::None;
    pub const TOP: RiskLevel = RiskLevel::High;

    pub fn join(self, other: RiskLevel) -> RiskLevel {
        self.max(other)
    }

    pub fn join_all<I: IntoIterator<Item = RiskLevel>>(levels: I) -> RiskLevel {
        levels.into_iter().fold(Self::BOTTOM, Self::join)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "NONE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Ask,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Ask => "ask",
            Action::Block => "block",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Write,
    Edit,
    MultiEdit,
    Run,
    Delegate,
    Other,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Write => "write",
            OperationKind::Edit => "edit",
            OperationKind::MultiEdit => "multi-edit",
            OperationKind::Run => "run",
            OperationKind::Delegate => "delegate",
            OperationKind::Other => "other",
        }
    }

    /// Lock purpose recorded for file-mutating kinds.
    pub fn lock_purpose(&self) -> Option<&'static str> {
        match self {
            OperationKind::Write => Some("writing"),
            OperationKind::Edit | OperationKind::MultiEdit => Some("editing"),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Completed,
    Failed,
    Initialized,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Completed => "completed",
            ActivityStatus::Failed => "failed",
            ActivityStatus::Initialized => "initialized",
        }
    }

    pub fn parse(s: &str) -> Option<ActivityStatus> {
        match s.trim() {
            "completed" => Some(ActivityStatus::Completed),
            "failed" => Some(ActivityStatus::Failed),
            "initialized" => Some(ActivityStatus::Initialized),
            _ => None,
        }
    }
}

/// Category tags shared by findings, decisions and errors.
pub mod category {
    pub const SECRETS: &str = "secrets";
    pub const INJECTION: &str = "injection";
    pub const LEAKAGE: &str = "leakage";
    pub const SCHEMA: &str = "schema";

    pub const EVALUATOR_ERROR: &str = "evaluator-error";
    pub const SCAN_LIMIT: &str = "scan-limit";

    pub const LOCK_CONFLICT: &str = "lock-conflict";
    pub const CONTAINERIZATION_REQUIRED: &str = "containerization-required";
    pub const LEDGER_UNAVAILABLE: &str = "ledger-unavailable";
    pub const MALFORMED_REQUEST: &str = "malformed-request";
    pub const CONFIG: &str = "config";

    pub const ADVISORY: &str = "advisory";
    pub const CLEAN: &str = "clean";
    pub const NOT_APPLICABLE: &str = "not-applicable";

    /// Finding categories that force BLOCK at HIGH severity unless configured otherwise.
    pub const DEFAULT_HARD_BLOCK: [&str; 4] = [SECRETS, INJECTION, LEAKAGE, SCHEMA];
}
