//! File-resident ledgers: `WORK_STATUS.md` for locks and activity,
//! `orchestration-index.md` for progress and alerts.

pub mod document;
pub mod escape;
pub mod guard;
pub mod ledger;
pub mod orchestration;
pub mod work_status;

pub use guard::LedgerFile;
pub use ledger::*;
