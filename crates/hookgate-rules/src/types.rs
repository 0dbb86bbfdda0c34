use hookgate_core::{Finding, Operation, OperationKind, RiskLevel};
use thiserror::Error;

/// What an evaluator sees of an operation.
#[derive(Clone, Copy, Debug)]
pub struct EvalTarget<'a> {
    pub kind: OperationKind,
    pub resource: Option<&'a str>,
    pub payload: &'a str,
    pub description: &'a str,
}

impl<'a> EvalTarget<'a> {
    /// `payload` is `op.payload()`, owned by the caller for the borrow's duration.
    pub fn new(op: &'a Operation, payload: &'a str) -> Self {
        Self {
            kind: op.kind(),
            resource: op.resource(),
            payload,
            description: op.description(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assessment {
    pub level: RiskLevel,
    pub findings: Vec<Finding>,
}

impl Assessment {
    /// Level is the join of the findings' severities.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let level = RiskLevel::join_all(findings.iter().map(|f| f.severity));
        Self { level, findings }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct EvaluatorError(pub String);

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule `{rule}`: invalid pattern: {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule `{rule}`: invalid path glob `{glob}`: {source}")]
    Glob {
        rule: String,
        glob: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("rule table {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("rule table {origin}: {message}")]
    Invalid { origin: String, message: String },

    #[error("read rule table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
