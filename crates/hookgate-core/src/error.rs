use thiserror::Error;

use crate::category;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("evaluator `{evaluator}` failed: {message}")]
    Evaluator { evaluator: String, message: String },

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GateError {
    pub fn category(&self) -> &'static str {
        match self {
            GateError::MalformedRequest(_) => category::MALFORMED_REQUEST,
            GateError::Evaluator { .. } => category::EVALUATOR_ERROR,
            GateError::LedgerUnavailable(_) => category::LEDGER_UNAVAILABLE,
            GateError::Config(_) => category::CONFIG,
        }
    }
}
