use glob::{MatchOptions, Pattern};
use hookgate_core::{Finding, OperationKind, RiskLevel};
use regex::{Regex, RegexBuilder};

use crate::table::{EvaluatorSpec, Escalation, RuleSpec, RuleTarget};
use crate::types::{Assessment, EvalTarget, EvaluatorError, RuleError};

/// A pure classifier of one operation.
///
/// Implementations must not touch ledger state and must be safe to call
/// in any order, including concurrently.
pub trait RuleEvaluator: Send + Sync {
    fn id(&self) -> &str;

    fn applies_to(&self, _target: &EvalTarget<'_>) -> bool {
        true
    }

    fn evaluate(&self, target: &EvalTarget<'_>) -> Result<Assessment, EvaluatorError>;
}

/// One compiled row of a rule table.
#[derive(Debug)]
pub struct PatternRule {
    pub id: String,
    pub category: String,
    pub severity: RiskLevel,
    pub message: String,
    target: RuleTarget,
    regex: Regex,
    exclude: Vec<String>,
    paths: Vec<Pattern>,
}

impl PatternRule {
    pub fn compile(spec: &RuleSpec) -> Result<Self, RuleError> {
        let regex = RegexBuilder::new(&spec.pattern)
            .case_insensitive(!spec.case_sensitive)
            .build()
            .map_err(|source| RuleError::Pattern { rule: spec.id.clone(), source })?;
        let paths = spec
            .paths
            .iter()
            .map(|g| {
                Pattern::new(g).map_err(|source| RuleError::Glob {
                    rule: spec.id.clone(),
                    glob: g.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: spec.id.clone(),
            category: spec.category.clone(),
            severity: spec.severity,
            message: spec.message.clone(),
            target: spec.target,
            regex,
            exclude: spec.exclude.iter().map(|e| e.to_lowercase()).collect(),
            paths,
        })
    }

    fn path_allowed(&self, resource: Option<&str>) -> bool {
        if self.paths.is_empty() {
            return true;
        }
        let opts = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        resource.is_some_and(|r| self.paths.iter().any(|p| p.matches_with(r, opts)))
    }

    /// True when at least one match survives the exclude list.
    pub fn fires(&self, target: &EvalTarget<'_>) -> bool {
        if !self.path_allowed(target.resource) {
            return false;
        }
        let haystack = match self.target {
            RuleTarget::Payload => target.payload,
            RuleTarget::Path => match target.resource {
                Some(r) => r,
                None => return false,
            },
            RuleTarget::Description => target.description,
        };
        self.regex.find_iter(haystack).any(|m| {
            let text = m.as_str().to_lowercase();
            !self.exclude.iter().any(|e| text.contains(e))
        })
    }

    pub fn finding(&self) -> Finding {
        Finding::new(self.id.clone(), self.category.clone(), self.severity, self.message.clone())
    }
}

/// Generic matcher over one evaluator's rows.
#[derive(Debug)]
pub struct TableEvaluator {
    id: String,
    kinds: Vec<OperationKind>,
    rules: Vec<PatternRule>,
    escalate: Option<Escalation>,
}

impl TableEvaluator {
    pub fn compile(spec: &EvaluatorSpec) -> Result<Self, RuleError> {
        let rules = spec.rules.iter().map(PatternRule::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: spec.id.clone(),
            kinds: spec.kinds.clone(),
            rules,
            escalate: spec.escalate,
        })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

impl RuleEvaluator for TableEvaluator {
    fn id(&self) -> &str {
        &self.id
    }

    fn applies_to(&self, target: &EvalTarget<'_>) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&target.kind)
    }

    fn evaluate(&self, target: &EvalTarget<'_>) -> Result<Assessment, EvaluatorError> {
        let findings: Vec<Finding> = self.rules.iter().filter(|r| r.fires(target)).map(PatternRule::finding).collect();
        let mut assessment = Assessment::from_findings(findings);
        if let Some(esc) = self.escalate {
            if assessment.findings.len() >= esc.min_findings {
                assessment.level = assessment.level.join(esc.level);
            }
        }
        Ok(assessment)
    }
}
