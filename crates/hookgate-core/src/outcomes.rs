use serde::{Deserialize, Serialize};

use crate::{ids::*, types::*};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// `refreshed` is true when the holder already held the resource.
    Acquired { record: LockRecord, refreshed: bool },
    Conflict(LockRecord),
}

impl AcquireOutcome {
    pub fn is_acquired(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired { .. })
    }
}

/// Who is asking for a release. Only the holder, or an explicit override, removes a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReleaseBy {
    Holder(ActorId),
    Override,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released(LockRecord),
    /// Nothing was held; releasing is a no-op, never an error.
    NotHeld,
    HeldByOther(LockRecord),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockStatus {
    Free,
    Held(LockRecord),
}

impl LockStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, LockStatus::Held(_))
    }

    pub fn record(&self) -> Option<&LockRecord> {
        match self {
            LockStatus::Free => None,
            LockStatus::Held(r) => Some(r),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStep {
    LedgerInit,
    Activity,
    Release,
    Broadcast,
    Alert,
    Progress,
}

impl SyncStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStep::LedgerInit => "ledger-init",
            SyncStep::Activity => "activity",
            SyncStep::Release => "release",
            SyncStep::Broadcast => "broadcast",
            SyncStep::Alert => "alert",
            SyncStep::Progress => "progress",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFailure {
    pub step: SyncStep,
    pub error: String,
}

/// Result of the after-the-fact coordination sync.
///
/// The underlying action already happened, so a failed step is reported here
/// instead of being raised; `is_degraded` tells the caller whether any step failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub completed: Vec<SyncStep>,
    pub failures: Vec<SyncFailure>,
    pub notified_roles: Vec<String>,
}

impl SyncReport {
    pub fn record<T, E: std::fmt::Display>(&mut self, step: SyncStep, res: Result<T, E>) -> Option<T> {
        match res {
            Ok(v) => {
                self.completed.push(step);
                Some(v)
            }
            Err(e) => {
                self.failures.push(SyncFailure { step, error: e.to_string() });
                None
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}
