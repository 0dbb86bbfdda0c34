use std::sync::{Mutex, MutexGuard};

use hookgate_core::{
    time, AcquireOutcome, ActivityRecord, ActorId, AlertRecord, LockRecord, LockStatus, ProgressRecord, ReleaseBy,
    ReleaseOutcome,
};

use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::state::{ActivityLog, Coordination, WorkStatus, DEFAULT_ACTIVITY_CAP};
use crate::traits::{ActivityLedger, Ledger, LockLedger, ProgressLedger};

/// In-memory ledger for tests and dry runs. Not durable.
pub struct InMemoryLedger {
    cap: usize,
    work: Mutex<WorkStatus>,
    coordination: Mutex<Coordination>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::with_cap(DEFAULT_ACTIVITY_CAP)
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap,
            work: Mutex::new(WorkStatus::default()),
            coordination: Mutex::new(Coordination::default()),
        }
    }

    fn work(&self) -> Result<MutexGuard<'_, WorkStatus>, LedgerError> {
        self.work.lock().map_err(|_| poisoned("work status"))
    }

    fn coordination(&self) -> Result<MutexGuard<'_, Coordination>, LedgerError> {
        self.coordination.lock().map_err(|_| poisoned("coordination"))
    }
}

fn poisoned(state: &str) -> LedgerError {
    warn!(state, "in-memory ledger poisoned by a panicked writer");
    LedgerError::Poisoned
}

impl LockLedger for InMemoryLedger {
    fn acquire(&self, resource: &str, holder: &ActorId, purpose: &str) -> Result<AcquireOutcome, LedgerError> {
        let out = self.work()?.locks.acquire(resource, holder, purpose, time::now());
        debug!(resource, holder = %holder, acquired = out.is_acquired(), "acquire");
        Ok(out)
    }

    fn release(&self, resource: &str, by: &ReleaseBy) -> Result<ReleaseOutcome, LedgerError> {
        let out = self.work()?.locks.release(resource, by);
        debug!(resource, outcome = ?out, "release");
        Ok(out)
    }

    fn query(&self, resource: &str) -> Result<LockStatus, LedgerError> {
        Ok(self.work()?.locks.query(resource))
    }

    fn locks(&self) -> Result<Vec<LockRecord>, LedgerError> {
        Ok(self.work()?.locks.records().to_vec())
    }
}

impl ActivityLedger for InMemoryLedger {
    fn append(&self, record: ActivityRecord) -> Result<(), LedgerError> {
        debug!(resource = %record.resource, operation = %record.operation, "append activity");
        self.work()?.activity.append(record, self.cap);
        Ok(())
    }

    fn activities(&self) -> Result<ActivityLog, LedgerError> {
        Ok(self.work()?.activity.clone())
    }
}

impl ProgressLedger for InMemoryLedger {
    fn update(&self, record: ProgressRecord) -> Result<(), LedgerError> {
        self.coordination()?.progress.update(record);
        Ok(())
    }

    fn signal(&self, alert: AlertRecord) -> Result<(), LedgerError> {
        debug!(topic = %alert.topic, roles = alert.roles.len(), "signal");
        self.coordination()?.alerts.raise(alert);
        Ok(())
    }

    fn progress(&self) -> Result<Vec<ProgressRecord>, LedgerError> {
        Ok(self.coordination()?.progress.records().to_vec())
    }

    fn alerts(&self) -> Result<Vec<AlertRecord>, LedgerError> {
        Ok(self.coordination()?.alerts.alerts().to_vec())
    }

    fn clear_alerts(&self, topic: Option<&str>) -> Result<usize, LedgerError> {
        let cleared = self.coordination()?.alerts.clear(topic);
        debug!(topic, cleared, "clear alerts");
        Ok(cleared)
    }
}

impl Ledger for InMemoryLedger {
    fn init(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}
