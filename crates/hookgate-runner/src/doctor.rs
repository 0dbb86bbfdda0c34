use anyhow::{anyhow, Context, Result};
use std::path::Path;

use hookgate_ledger::Ledger;
use hookgate_ledger_fs::FsLedger;

use crate::Config;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn from_result(name: &'static str, res: Result<String>) -> Self {
        match res {
            Ok(detail) => Self { name, ok: true, detail },
            Err(e) => Self { name, ok: false, detail: format!("{e:#}") },
        }
    }
}

/// Check everything the hooks need from a workspace. Later checks fall back
/// to the default config when the file does not parse.
pub fn doctor(root: &Path) -> Vec<Check> {
    let mut checks = Vec::new();

    if !root.is_dir() {
        checks.push(Check::from_result(
            "workspace",
            Err(anyhow!("workspace root {} is not a directory", root.display())),
        ));
        return checks;
    }

    let cfg_path = Config::config_path(root);
    let loaded = Config::load_or_default(root);
    let cfg = loaded.as_ref().cloned().unwrap_or_default();
    checks.push(Check::from_result(
        "config",
        loaded.map(|_| {
            if cfg_path.exists() {
                format!("{} parsed", cfg_path.display())
            } else {
                "no config file; using defaults".to_string()
            }
        }),
    ));

    checks.push(Check::from_result(
        "rules",
        cfg.build_evaluators(root).map(|set| format!("{} evaluators compiled: {}", set.len(), set.ids().join(", "))),
    ));

    checks.push(Check::from_result(
        "writable",
        tempfile::NamedTempFile::new_in(root)
            .with_context(|| format!("create a file in {}", root.display()))
            .map(|_| format!("{} is writable", root.display())),
    ));

    let ledger = FsLedger::open(root, cfg.ledger_options());
    checks.push(Check::from_result(
        "ledgers",
        ledger.snapshot().context("read ledgers").map(|s| {
            format!(
                "{} locks, {} activities, {} progress records, {} alerts",
                s.locks.len(),
                s.activities.len(),
                s.progress.len(),
                s.alerts.len()
            )
        }),
    ));

    checks
}

pub fn all_ok(checks: &[Check]) -> bool {
    checks.iter().all(|c| c.ok)
}
