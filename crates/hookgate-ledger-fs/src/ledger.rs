use std::path::{Path, PathBuf};

use hookgate_core::{
    time, AcquireOutcome, ActivityRecord, ActorId, AlertRecord, LockRecord, LockStatus, ProgressRecord, ReleaseBy,
    ReleaseOutcome,
};
use hookgate_ledger::{
    ActivityLedger, ActivityLog, Coordination, Ledger, LedgerError, LockLedger, ProgressLedger, WorkStatus,
    DEFAULT_ACTIVITY_CAP,
};
use tracing::debug;

use crate::guard::LedgerFile;
use crate::{orchestration, work_status};

pub const WORK_STATUS_FILE: &str = "WORK_STATUS.md";
pub const ORCHESTRATION_FILE: &str = "orchestration-index.md";

/// File names and retention for an [`FsLedger`].
#[derive(Clone, Debug)]
pub struct FsLedgerOptions {
    pub work_status_file: String,
    pub orchestration_file: String,
    pub activity_cap: usize,
}

impl Default for FsLedgerOptions {
    fn default() -> Self {
        Self {
            work_status_file: WORK_STATUS_FILE.to_string(),
            orchestration_file: ORCHESTRATION_FILE.to_string(),
            activity_cap: DEFAULT_ACTIVITY_CAP,
        }
    }
}

/// Ledgers kept as two markdown documents in the workspace root.
pub struct FsLedger {
    root: PathBuf,
    work: LedgerFile,
    coordination: LedgerFile,
    cap: usize,
}

impl FsLedger {
    pub fn open(root: &Path, opts: FsLedgerOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            work: LedgerFile::new(root, &opts.work_status_file),
            coordination: LedgerFile::new(root, &opts.orchestration_file),
            cap: opts.activity_cap,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn work_status_path(&self) -> &Path {
        self.work.path()
    }

    pub fn orchestration_path(&self) -> &Path {
        self.coordination.path()
    }

    fn read_work(&self) -> Result<WorkStatus, LedgerError> {
        match self.work.read()? {
            Some(text) => Ok(work_status::decode(&text, self.work.path())?.1),
            None => Ok(WorkStatus::default()),
        }
    }

    fn modify_work<T>(&self, op: impl FnOnce(&mut WorkStatus) -> T) -> Result<T, LedgerError> {
        let path = self.work.path().to_path_buf();
        self.work.modify(|current| {
            let text = current.map(str::to_string).unwrap_or_else(work_status::template);
            let (doc, mut state) = work_status::decode(&text, &path)?;
            let out = op(&mut state);
            Ok((Some(work_status::encode(doc, &state)), out))
        })
    }

    fn read_coordination(&self) -> Result<Coordination, LedgerError> {
        match self.coordination.read()? {
            Some(text) => Ok(orchestration::decode(&text, self.coordination.path())?.1),
            None => Ok(Coordination::default()),
        }
    }

    fn modify_coordination<T>(&self, op: impl FnOnce(&mut Coordination) -> T) -> Result<T, LedgerError> {
        let path = self.coordination.path().to_path_buf();
        self.coordination.modify(|current| {
            let text = current.map(str::to_string).unwrap_or_else(orchestration::template);
            let (doc, mut state) = orchestration::decode(&text, &path)?;
            let out = op(&mut state);
            Ok((Some(orchestration::encode(doc, &state, &path)), out))
        })
    }
}

impl LockLedger for FsLedger {
    fn acquire(&self, resource: &str, holder: &ActorId, purpose: &str) -> Result<AcquireOutcome, LedgerError> {
        let out = self.modify_work(|s| s.locks.acquire(resource, holder, purpose, time::now()))?;
        debug!(resource, holder = %holder, acquired = out.is_acquired(), "acquire");
        Ok(out)
    }

    fn release(&self, resource: &str, by: &ReleaseBy) -> Result<ReleaseOutcome, LedgerError> {
        let out = self.modify_work(|s| s.locks.release(resource, by))?;
        debug!(resource, outcome = ?out, "release");
        Ok(out)
    }

    fn query(&self, resource: &str) -> Result<LockStatus, LedgerError> {
        Ok(self.read_work()?.locks.query(resource))
    }

    fn locks(&self) -> Result<Vec<LockRecord>, LedgerError> {
        Ok(self.read_work()?.locks.records().to_vec())
    }
}

impl ActivityLedger for FsLedger {
    fn append(&self, record: ActivityRecord) -> Result<(), LedgerError> {
        let cap = self.cap;
        self.modify_work(|s| s.activity.append(record, cap))
    }

    fn activities(&self) -> Result<ActivityLog, LedgerError> {
        Ok(self.read_work()?.activity)
    }
}

impl ProgressLedger for FsLedger {
    fn update(&self, record: ProgressRecord) -> Result<(), LedgerError> {
        self.modify_coordination(|s| s.progress.update(record))
    }

    fn signal(&self, alert: AlertRecord) -> Result<(), LedgerError> {
        self.modify_coordination(|s| s.alerts.raise(alert))
    }

    fn progress(&self) -> Result<Vec<ProgressRecord>, LedgerError> {
        Ok(self.read_coordination()?.progress.records().to_vec())
    }

    fn alerts(&self) -> Result<Vec<AlertRecord>, LedgerError> {
        Ok(self.read_coordination()?.alerts.alerts().to_vec())
    }

    fn clear_alerts(&self, topic: Option<&str>) -> Result<usize, LedgerError> {
        self.modify_coordination(|s| s.alerts.clear(topic))
    }
}

impl Ledger for FsLedger {
    fn init(&self) -> Result<(), LedgerError> {
        self.work.modify(|current| {
            Ok((current.is_none().then(work_status::template), ()))
        })?;
        self.coordination.modify(|current| {
            Ok((current.is_none().then(orchestration::template), ()))
        })
    }
}
