//! Ledger state and its transitions, independent of where the state lives.
//!
//! Backends load a state value, apply one transition and store it back
//! inside a single critical section.

use chrono::{DateTime, Utc};
use hookgate_core::{
    AcquireOutcome, ActivityRecord, ActorId, AlertRecord, LockRecord, LockStatus, ProgressRecord, ReleaseBy,
    ReleaseOutcome,
};

pub const DEFAULT_ACTIVITY_CAP: usize = 20;

/// Active holds, one per resource, in acquisition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockTable {
    records: Vec<LockRecord>,
}

impl LockTable {
    pub fn from_records(records: Vec<LockRecord>) -> Self {
        let mut table = Self::default();
        // Later lines win if a hand-edited file lists a resource twice.
        for r in records {
            table.records.retain(|e| e.resource != r.resource);
            table.records.push(r);
        }
        table
    }

    pub fn records(&self) -> &[LockRecord] {
        &self.records
    }

    pub fn query(&self, resource: &str) -> LockStatus {
        match self.records.iter().find(|r| r.resource == resource) {
            Some(r) => LockStatus::Held(r.clone()),
            None => LockStatus::Free,
        }
    }

    /// Another holder's record is a conflict. The same holder refreshes its
    /// record in place.
    pub fn acquire(&mut self, resource: &str, holder: &ActorId, purpose: &str, now: DateTime<Utc>) -> AcquireOutcome {
        if let Some(existing) = self.records.iter_mut().find(|r| r.resource == resource) {
            if &existing.holder != holder {
                return AcquireOutcome::Conflict(existing.clone());
            }
            existing.purpose = purpose.to_string();
            existing.acquired_at = now;
            return AcquireOutcome::Acquired { record: existing.clone(), refreshed: true };
        }
        let record = LockRecord {
            resource: resource.to_string(),
            holder: holder.clone(),
            purpose: purpose.to_string(),
            acquired_at: now,
        };
        self.records.push(record.clone());
        AcquireOutcome::Acquired { record, refreshed: false }
    }

    pub fn release(&mut self, resource: &str, by: &ReleaseBy) -> ReleaseOutcome {
        let Some(idx) = self.records.iter().position(|r| r.resource == resource) else {
            return ReleaseOutcome::NotHeld;
        };
        match by {
            ReleaseBy::Holder(actor) if &self.records[idx].holder != actor => {
                ReleaseOutcome::HeldByOther(self.records[idx].clone())
            }
            _ => ReleaseOutcome::Released(self.records.remove(idx)),
        }
    }
}

/// Bounded activity history, most-recent-first.
///
/// Once anything has been trimmed, `truncated` stays set so the single
/// marker keeps being written on every later render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityLog {
    entries: Vec<ActivityRecord>,
    truncated: bool,
}

impl ActivityLog {
    pub fn new(entries: Vec<ActivityRecord>, truncated: bool) -> Self {
        Self { entries, truncated }
    }

    pub fn entries(&self) -> &[ActivityRecord] {
        &self.entries
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert at the head, then trim to `cap`.
    pub fn append(&mut self, record: ActivityRecord, cap: usize) {
        self.entries.insert(0, record);
        self.trim(cap);
    }

    pub fn trim(&mut self, cap: usize) {
        let cap = cap.max(1);
        if self.entries.len() > cap {
            self.entries.truncate(cap);
            self.truncated = true;
        }
    }

    pub fn into_parts(self) -> (Vec<ActivityRecord>, bool) {
        (self.entries, self.truncated)
    }
}

/// Latest progress per (actor, topic).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressBoard {
    records: Vec<ProgressRecord>,
}

impl ProgressBoard {
    pub fn from_records(records: Vec<ProgressRecord>) -> Self {
        let mut board = Self::default();
        for r in records {
            board.update(r);
        }
        board
    }

    pub fn records(&self) -> &[ProgressRecord] {
        &self.records
    }

    /// Drop any record with the same key, then append.
    pub fn update(&mut self, record: ProgressRecord) {
        self.records.retain(|r| r.key() != record.key());
        self.records.push(record);
    }

    pub fn get(&self, actor: &str, topic: &str) -> Option<&ProgressRecord> {
        self.records.iter().find(|r| r.key() == (actor, topic))
    }
}

/// Additive review requests; only [`AlertList::clear`] removes them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlertList {
    alerts: Vec<AlertRecord>,
}

impl AlertList {
    pub fn new(alerts: Vec<AlertRecord>) -> Self {
        Self { alerts }
    }

    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    pub fn raise(&mut self, alert: AlertRecord) {
        self.alerts.push(alert);
    }

    /// Clear one topic, or everything when `topic` is `None`. Returns how many went.
    pub fn clear(&mut self, topic: Option<&str>) -> usize {
        let before = self.alerts.len();
        match topic {
            Some(t) => self.alerts.retain(|a| a.topic != t),
            None => self.alerts.clear(),
        }
        before - self.alerts.len()
    }
}

/// Everything in the lock/activity document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkStatus {
    pub locks: LockTable,
    pub activity: ActivityLog,
}

/// Everything in the progress/alert document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coordination {
    pub progress: ProgressBoard,
    pub alerts: AlertList,
}
