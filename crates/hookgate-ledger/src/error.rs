use std::path::PathBuf;

use hookgate_core::GateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Corrupt { path: PathBuf, line: usize, message: String },

    #[error("ledger state poisoned by a panicked writer")]
    Poisoned,
}

impl From<LedgerError> for GateError {
    fn from(e: LedgerError) -> Self {
        GateError::LedgerUnavailable(e.to_string())
    }
}

impl LedgerError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LedgerError::Io { op, path: path.into(), source }
    }
}
