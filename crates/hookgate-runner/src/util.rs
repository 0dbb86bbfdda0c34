use std::path::{Path, PathBuf};

use hookgate_core::{infer_actor, ActorId};

use crate::Config;

pub const PROJECT_DIR_VAR: &str = "CLAUDE_PROJECT_DIR";
pub const AGENT_NAME_VAR: &str = "CLAUDE_AGENT_NAME";

/// Values the host passes through the environment.
#[derive(Clone, Debug, Default)]
pub struct HookEnv {
    pub project_dir: Option<PathBuf>,
    pub agent_name: Option<String>,
}

impl HookEnv {
    pub fn from_env() -> Self {
        let non_empty = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        Self {
            project_dir: non_empty(PROJECT_DIR_VAR).map(PathBuf::from),
            agent_name: non_empty(AGENT_NAME_VAR),
        }
    }
}

/// Workspace root: explicit flag, then the host's project dir, then the
/// request's `cwd`.
pub fn resolve_root(flag: Option<&Path>, env: &HookEnv, cwd: Option<&str>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| env.project_dir.clone())
        .or_else(|| cwd.filter(|c| !c.is_empty()).map(PathBuf::from))
}

/// `path` relative to `root` when it lies under it; otherwise unchanged.
pub fn relative_path(path: &str, root: &Path) -> String {
    let p = Path::new(path);
    if !p.is_absolute() {
        return path.to_string();
    }
    match p.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
        _ => path.to_string(),
    }
}

pub fn resolve_actor(env: &HookEnv, description: Option<&str>, cfg: &Config) -> ActorId {
    if let Some(name) = &env.agent_name {
        return ActorId::new(name.trim());
    }
    description
        .and_then(|d| infer_actor(d, &cfg.actor.keywords))
        .unwrap_or_else(|| ActorId::new(cfg.actor.default.clone()))
}
