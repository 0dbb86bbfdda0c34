use hookgate_core::{
    AcquireOutcome, ActivityRecord, ActorId, AlertRecord, LedgerSnapshot, LockRecord, LockStatus, ProgressRecord,
    ReleaseBy, ReleaseOutcome,
};

use crate::error::LedgerError;
use crate::state::ActivityLog;

/// Per-resource exclusive holds.
///
/// `acquire` must be one atomic check-then-write: two concurrent callers for
/// the same resource never both see `Acquired` unless they are the same holder.
pub trait LockLedger: Send + Sync {
    fn acquire(&self, resource: &str, holder: &ActorId, purpose: &str) -> Result<AcquireOutcome, LedgerError>;
    fn release(&self, resource: &str, by: &ReleaseBy) -> Result<ReleaseOutcome, LedgerError>;
    fn query(&self, resource: &str) -> Result<LockStatus, LedgerError>;
    fn locks(&self) -> Result<Vec<LockRecord>, LedgerError>;
}

pub trait ActivityLedger: Send + Sync {
    /// Insert most-recent-first and enforce the retention cap.
    fn append(&self, record: ActivityRecord) -> Result<(), LedgerError>;
    fn activities(&self) -> Result<ActivityLog, LedgerError>;
}

pub trait ProgressLedger: Send + Sync {
    /// Replace the record for `(actor, topic)`.
    fn update(&self, record: ProgressRecord) -> Result<(), LedgerError>;
    /// Add an alert. Never replaces an earlier one.
    fn signal(&self, alert: AlertRecord) -> Result<(), LedgerError>;
    fn progress(&self) -> Result<Vec<ProgressRecord>, LedgerError>;
    fn alerts(&self) -> Result<Vec<AlertRecord>, LedgerError>;
    fn clear_alerts(&self, topic: Option<&str>) -> Result<usize, LedgerError>;
}

pub trait Ledger: LockLedger + ActivityLedger + ProgressLedger {
    /// Create backing storage if missing. Existing content is left alone.
    fn init(&self) -> Result<(), LedgerError>;

    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let (activities, activities_truncated) = self.activities()?.into_parts();
        Ok(LedgerSnapshot {
            locks: self.locks()?,
            activities,
            activities_truncated,
            progress: self.progress()?,
            alerts: self.alerts()?,
        })
    }
}
