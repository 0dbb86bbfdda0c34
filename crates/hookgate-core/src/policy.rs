use serde::{Deserialize, Serialize};

use crate::{category, Action, Decision, GateError};

/// What the gate answers when a ledger cannot be read or written.
///
/// One policy, applied through [`LedgerFailurePolicy::decide`] on every path
/// that touches a ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerFailurePolicy {
    #[default]
    FailClosed,
    FailOpen,
}

impl LedgerFailurePolicy {
    pub fn action(&self) -> Action {
        match self {
            LedgerFailurePolicy::FailClosed => Action::Block,
            LedgerFailurePolicy::FailOpen => Action::Allow,
        }
    }

    /// The answer for a failed ledger read or write; `err` lands in the reason.
    pub fn decide(&self, err: &GateError) -> Decision {
        let reason = match self {
            LedgerFailurePolicy::FailClosed => {
                format!("Coordination {err}; refusing the operation because lock state cannot be verified.")
            }
            LedgerFailurePolicy::FailOpen => {
                format!("Coordination {err}; allowing the operation without lock verification.")
            }
        };
        Decision {
            action: self.action(),
            category: category::LEDGER_UNAVAILABLE.to_string(),
            reason,
            findings: vec![],
            suppress_output: false,
            conflict: None,
        }
    }
}
