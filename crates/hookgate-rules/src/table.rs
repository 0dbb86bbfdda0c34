use std::path::Path;

use hookgate_core::{OperationKind, RiskLevel};
use serde::{Deserialize, Serialize};

use crate::rule::TableEvaluator;
use crate::types::RuleError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleTarget {
    #[default]
    Payload,
    Path,
    Description,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    pub category: String,
    pub severity: RiskLevel,
    pub pattern: String,
    pub message: String,
    #[serde(default)]
    pub target: RuleTarget,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub min_findings: usize,
    pub level: RiskLevel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorSpec {
    pub id: String,
    /// Operation kinds this evaluator applies to; empty means all.
    #[serde(default)]
    pub kinds: Vec<OperationKind>,
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub escalate: Option<Escalation>,
}

/// A YAML rule table: evaluators in registration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub evaluators: Vec<EvaluatorSpec>,
}

const BUILTIN_TABLE: &str = include_str!("../rules/default.yaml");

impl RuleTable {
    pub fn parse(yaml: &str, origin: &str) -> Result<Self, RuleError> {
        let table: RuleTable =
            serde_yaml::from_str(yaml).map_err(|source| RuleError::Yaml { origin: origin.to_string(), source })?;
        table.check(origin)?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let s = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&s, &path.display().to_string())
    }

    pub fn builtin() -> Result<Self, RuleError> {
        Self::parse(BUILTIN_TABLE, "builtin")
    }

    fn check(&self, origin: &str) -> Result<(), RuleError> {
        let mut seen: Vec<&str> = Vec::new();
        for ev in &self.evaluators {
            if seen.contains(&ev.id.as_str()) {
                return Err(RuleError::Invalid {
                    origin: origin.to_string(),
                    message: format!("duplicate evaluator id `{}`", ev.id),
                });
            }
            seen.push(&ev.id);
            if ev.rules.is_empty() {
                return Err(RuleError::Invalid {
                    origin: origin.to_string(),
                    message: format!("evaluator `{}` has no rules", ev.id),
                });
            }
        }
        Ok(())
    }

    pub fn compile(&self) -> Result<Vec<TableEvaluator>, RuleError> {
        self.evaluators.iter().map(TableEvaluator::compile).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses_and_compiles() {
        let table = RuleTable::builtin().unwrap();
        let compiled = table.compile().unwrap();
        assert!(!compiled.is_empty());
        let ids: Vec<&str> = table.evaluators.iter().map(|e| e.id.as_str()).collect();
        for expected in ["secrets", "injection", "schema", "leakage"] {
            assert!(ids.contains(&expected), "missing evaluator {expected}");
        }
    }

    #[test]
    fn minimal_table_uses_defaults() {
        let yaml = r#"
evaluators:
  - id: style
    rules:
      - id: todo
        category: style
        severity: low
        pattern: 'TODO'
        message: leftover TODO
"#;
        let table = RuleTable::parse(yaml, "inline").unwrap();
        let rule = &table.evaluators[0].rules[0];
        assert_eq!(rule.target, RuleTarget::Payload);
        assert!(rule.exclude.is_empty());
        assert!(table.evaluators[0].kinds.is_empty());
        assert!(table.evaluators[0].escalate.is_none());
    }

    #[test]
    fn duplicate_evaluator_ids_are_rejected() {
        let yaml = r#"
evaluators:
  - id: a
    rules: [{ id: x, category: c, severity: low, pattern: 'x', message: m }]
  - id: a
    rules: [{ id: y, category: c, severity: low, pattern: 'y', message: m }]
"#;
        assert!(matches!(RuleTable::parse(yaml, "inline"), Err(RuleError::Invalid { .. })));
    }

    #[test]
    fn unknown_severity_is_a_yaml_error() {
        let yaml = r#"
evaluators:
  - id: a
    rules: [{ id: x, category: c, severity: critical, pattern: 'x', message: m }]
"#;
        assert!(matches!(RuleTable::parse(yaml, "inline"), Err(RuleError::Yaml { .. })));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.yaml");
        std::fs::write(
            &path,
            "evaluators:\n  - id: extra\n    rules: [{ id: x, category: c, severity: low, pattern: 'x', message: m }]\n",
        )
        .unwrap();
        let table = RuleTable::load(&path).unwrap();
        assert_eq!(table.evaluators[0].id, "extra");
    }
}
