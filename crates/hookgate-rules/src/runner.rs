use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use hookgate_core::{category, EvaluatorOutput, Finding, GateError, RiskLevel};
use tracing::{debug, warn};

use crate::rule::RuleEvaluator;
use crate::table::RuleTable;
use crate::types::{EvalTarget, RuleError};

/// Registered evaluators, run in registration order.
#[derive(Default)]
pub struct EvaluatorSet {
    evaluators: Vec<Box<dyn RuleEvaluator>>,
}

impl EvaluatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding the compiled built-in table.
    pub fn with_builtin() -> Result<Self, RuleError> {
        let mut set = Self::new();
        set.extend(&RuleTable::builtin()?, "builtin")?;
        Ok(set)
    }

    pub fn register(&mut self, evaluator: Box<dyn RuleEvaluator>) -> Result<(), RuleError> {
        if self.evaluators.iter().any(|e| e.id() == evaluator.id()) {
            return Err(RuleError::Invalid {
                origin: "registry".to_string(),
                message: format!("evaluator `{}` registered twice", evaluator.id()),
            });
        }
        self.evaluators.push(evaluator);
        Ok(())
    }

    pub fn extend(&mut self, table: &RuleTable, origin: &str) -> Result<(), RuleError> {
        for ev in table.compile()? {
            self.register(Box::new(ev)).map_err(|e| match e {
                RuleError::Invalid { message, .. } => RuleError::Invalid { origin: origin.to_string(), message },
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.evaluators.iter().map(|e| e.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Run every applicable evaluator. A failing or panicking evaluator
    /// contributes NONE plus one `evaluator-error` finding; the others are
    /// unaffected. Output order is registration order either way.
    pub fn run(&self, target: &EvalTarget<'_>, parallel: bool) -> Vec<EvaluatorOutput> {
        let applicable: Vec<&dyn RuleEvaluator> =
            self.evaluators.iter().map(|e| e.as_ref()).filter(|e| e.applies_to(target)).collect();

        if !parallel || applicable.len() < 2 {
            return applicable.into_iter().map(|e| run_isolated(e, target)).collect();
        }

        std::thread::scope(|s| {
            let handles: Vec<_> = applicable
                .iter()
                .map(|e| {
                    let e = *e;
                    (e.id(), s.spawn(move || run_isolated(e, target)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(id, h)| h.join().unwrap_or_else(|p| failed(id, panic_message(p.as_ref()))))
                .collect()
        })
    }
}

fn run_isolated(evaluator: &dyn RuleEvaluator, target: &EvalTarget<'_>) -> EvaluatorOutput {
    let started = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(target)));
    let elapsed_us = started.elapsed().as_micros() as u64;
    match result {
        Ok(Ok(assessment)) => {
            debug!(
                evaluator = evaluator.id(),
                level = %assessment.level,
                findings = assessment.findings.len(),
                elapsed_us,
                "evaluated"
            );
            EvaluatorOutput::new(evaluator.id(), assessment.level, assessment.findings)
        }
        Ok(Err(err)) => failed(evaluator.id(), err.to_string()),
        Err(payload) => failed(evaluator.id(), panic_message(payload.as_ref())),
    }
}

fn failed(evaluator: &str, message: String) -> EvaluatorOutput {
    let err = GateError::Evaluator { evaluator: evaluator.to_string(), message };
    warn!(evaluator, category = err.category(), "{err}; contribution isolated");
    EvaluatorOutput::new(
        evaluator,
        RiskLevel::None,
        vec![Finding::new(format!("{evaluator}-failed"), err.category(), RiskLevel::Low, err.to_string())],
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

/// Stand-in output for a payload too large to scan.
pub fn scan_limit_output(payload_len: usize, max_payload_bytes: usize) -> EvaluatorOutput {
    EvaluatorOutput::new(
        "scan-limit",
        RiskLevel::Medium,
        vec![Finding::new(
            "payload-too-large",
            category::SCAN_LIMIT,
            RiskLevel::Medium,
            format!("payload of {payload_len} bytes exceeds the {max_payload_bytes}-byte scan limit and was not inspected"),
        )],
    )
}
