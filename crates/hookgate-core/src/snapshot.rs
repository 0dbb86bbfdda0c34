use serde::Serialize;

use crate::types::*;

/// Read-only view of both ledgers, used for status output.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LedgerSnapshot {
    pub locks: Vec<LockRecord>,
    /// Most-recent-first.
    pub activities: Vec<ActivityRecord>,
    pub activities_truncated: bool,
    pub progress: Vec<ProgressRecord>,
    pub alerts: Vec<AlertRecord>,
}
