use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use hookgate_core::{
    category, default_actor_keywords, default_routes, ActorKeywords, AggregationPolicy, LedgerFailurePolicy, Route,
};
use hookgate_ledger_fs::{FsLedgerOptions, ORCHESTRATION_FILE, WORK_STATUS_FILE};
use hookgate_rules::{EvaluatorSet, RuleTable};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub actor: ActorConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub work_status_file: String,
    pub orchestration_file: String,
    pub activity_cap: usize,
    #[serde(default)]
    pub on_error: LedgerFailurePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            work_status_file: WORK_STATUS_FILE.to_string(),
            orchestration_file: ORCHESTRATION_FILE.to_string(),
            activity_cap: hookgate_ledger::DEFAULT_ACTIVITY_CAP,
            on_error: LedgerFailurePolicy::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    pub hard_block_categories: Vec<String>,
    pub max_payload_bytes: usize,
    #[serde(default)]
    pub parallel_evaluators: bool,
    /// Block operations described as build or deploy work while the
    /// workspace has no Dockerfile or compose file.
    #[serde(default = "enabled")]
    pub require_containerization: bool,
    #[serde(default = "default_containerization_keywords")]
    pub containerization_keywords: Vec<String>,
}

fn enabled() -> bool {
    true
}

fn default_containerization_keywords() -> Vec<String> {
    ["deploy", "build", "service", "app", "server", "api"].iter().map(|k| k.to_string()).collect()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            hard_block_categories: category::DEFAULT_HARD_BLOCK.iter().map(|c| c.to_string()).collect(),
            max_payload_bytes: 100_000,
            parallel_evaluators: false,
            require_containerization: true,
            containerization_keywords: default_containerization_keywords(),
        }
    }
}

impl GateConfig {
    /// Whether a word of `description` starts with one of the
    /// containerization keywords ("Building the API" matches, "happy" does not).
    pub fn describes_container_work(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        description
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .any(|w| self.containerization_keywords.iter().any(|k| w.starts_with(&k.to_lowercase())))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Used when neither the environment nor the description names an actor.
    pub default: String,
    #[serde(default = "default_actor_keywords")]
    pub keywords: Vec<ActorKeywords>,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            default: "unknown-agent".to_string(),
            keywords: default_actor_keywords(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RulesConfig {
    pub builtin: bool,
    /// YAML rule tables; `~` and `$VARS` are expanded, relative paths are
    /// taken from the workspace root.
    #[serde(default)]
    pub extra_tables: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { builtin: true, extra_tables: vec![] }
    }
}

impl Config {
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".hookgate").join("hookgate.toml")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    /// Config at the workspace's well-known path, or defaults when absent.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = Self::config_path(root);
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn ledger_options(&self) -> FsLedgerOptions {
        FsLedgerOptions {
            work_status_file: self.ledger.work_status_file.clone(),
            orchestration_file: self.ledger.orchestration_file.clone(),
            activity_cap: self.ledger.activity_cap,
        }
    }

    pub fn aggregation_policy(&self) -> AggregationPolicy {
        AggregationPolicy { hard_block_categories: self.gate.hard_block_categories.clone() }
    }

    pub fn extra_table_paths(&self, root: &Path) -> Result<Vec<PathBuf>> {
        self.rules
            .extra_tables
            .iter()
            .map(|raw| {
                let expanded = shellexpand::full(raw).with_context(|| format!("expand rule table path `{raw}`"))?;
                let p = PathBuf::from(expanded.as_ref());
                Ok(if p.is_absolute() { p } else { root.join(p) })
            })
            .collect()
    }

    /// Compile the configured evaluators: built-in table first, then the
    /// extra tables in listed order.
    pub fn build_evaluators(&self, root: &Path) -> Result<EvaluatorSet> {
        let mut set = if self.rules.builtin {
            EvaluatorSet::with_builtin().context("compile built-in rule table")?
        } else {
            EvaluatorSet::new()
        };
        for path in self.extra_table_paths(root)? {
            let table = RuleTable::load(&path)?;
            set.extend(&table, &path.display().to_string())
                .with_context(|| format!("register rule table {}", path.display()))?;
        }
        Ok(set)
    }
}
