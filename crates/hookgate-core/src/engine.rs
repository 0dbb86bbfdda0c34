use crate::{category, Action, Decision, Finding, RiskLevel};

/// Output of one evaluator, in registration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluatorOutput {
    pub evaluator: String,
    pub level: RiskLevel,
    pub findings: Vec<Finding>,
}

impl EvaluatorOutput {
    pub fn new(evaluator: impl Into<String>, level: RiskLevel, findings: Vec<Finding>) -> Self {
        Self { evaluator: evaluator.into(), level, findings }
    }

    pub fn clean(evaluator: impl Into<String>) -> Self {
        Self::new(evaluator, RiskLevel::None, vec![])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationPolicy {
    pub hard_block_categories: Vec<String>,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            hard_block_categories: category::DEFAULT_HARD_BLOCK.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl AggregationPolicy {
    pub fn is_hard_block(&self, finding: &Finding) -> bool {
        finding.severity == RiskLevel::High && self.hard_block_categories.iter().any(|c| c == &finding.category)
    }
}

/// Findings of one category, in first-appearance order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindingGroup<'a> {
    pub category: &'a str,
    pub findings: Vec<&'a Finding>,
}

impl FindingGroup<'_> {
    pub fn level(&self) -> RiskLevel {
        RiskLevel::join_all(self.findings.iter().map(|f| f.severity))
    }
}

/// Group by category. Group order follows first appearance, so it tracks
/// evaluator registration order rather than severity.
pub fn group_by_category(findings: &[Finding]) -> Vec<FindingGroup<'_>> {
    let mut groups: Vec<FindingGroup<'_>> = Vec::new();
    for f in findings {
        match groups.iter_mut().find(|g| g.category == f.category) {
            Some(g) => g.findings.push(f),
            None => groups.push(FindingGroup { category: &f.category, findings: vec![f] }),
        }
    }
    groups
}

/// Reduce evaluator outputs to one decision.
///
/// - overall = join of all evaluator levels
/// - a HIGH finding in a hard-block category forces BLOCK, before anything else
/// - otherwise HIGH/MEDIUM ask, LOW allows with advisories, NONE allows quietly
pub fn aggregate(outputs: &[EvaluatorOutput], policy: &AggregationPolicy) -> Decision {
    let overall = RiskLevel::join_all(outputs.iter().map(|o| o.level));
    let findings: Vec<Finding> = outputs.iter().flat_map(|o| o.findings.iter().cloned()).collect();

    if let Some(hit) = findings.iter().find(|f| policy.is_hard_block(f)) {
        let reason = format!(
            "Operation blocked: {} detected ({}). Remove the offending content before retrying.",
            hit.category, hit.message
        );
        let category = hit.category.clone();
        return Decision {
            action: Action::Block,
            category,
            reason,
            findings,
            suppress_output: false,
            conflict: None,
        };
    }

    let (action, category, reason) = match overall {
        RiskLevel::High | RiskLevel::Medium => {
            let groups = group_by_category(&findings);
            let category = groups
                .iter()
                .find(|g| g.level() == overall)
                .or_else(|| groups.first())
                .map(|g| g.category.to_string())
                .unwrap_or_else(|| "unclassified".to_string());
            let reason = format!(
                "Human confirmation required: overall risk is {overall} across {} finding(s). Review before proceeding.",
                findings.len()
            );
            (Action::Ask, category, reason)
        }
        RiskLevel::Low | RiskLevel::None if !findings.is_empty() => (
            Action::Allow,
            category::ADVISORY.to_string(),
            format!("Allowed with {} advisory finding(s).", findings.len()),
        ),
        _ => (Action::Allow, category::CLEAN.to_string(), "No findings.".to_string()),
    };

    let suppress_output = findings.is_empty();
    Decision {
        action,
        category,
        reason,
        findings,
        suppress_output,
        conflict: None,
    }
}
