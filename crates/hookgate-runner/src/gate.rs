use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hookgate_core::{
    aggregate, broadcast_for, time, AcquireOutcome, Action, ActivityRecord, ActivityStatus, ActorId, AlertRecord,
    Decision, GateError, LedgerFailurePolicy, LedgerSnapshot, Operation, OperationBody, ProgressRecord, ReleaseBy,
    ReleaseOutcome, SyncReport, SyncStep, CONTAINERIZATION_TOPIC,
};
use hookgate_ledger::{Ledger, LedgerError};
use hookgate_ledger_fs::FsLedger;
use hookgate_rules::{scan_limit_output, EvalTarget, EvaluatorSet};
use tracing::{debug, info, warn};

use crate::util::relative_path;
use crate::Config;

pub const PROGRESS_TOPIC: &str = "progress";
pub const COORDINATION_TOPIC: &str = "coordination";
pub const CONTAINER_ROLE: &str = "docker-expert";

const SOURCE_EXTENSIONS: [&str; 5] = ["py", "js", "ts", "go", "java"];
const SKIPPED_DIRS: [&str; 3] = ["node_modules", "target", "__pycache__"];
const LISTED_SOURCES: usize = 5;

/// Outcome of `session_start`.
#[derive(Clone, Debug, Default)]
pub struct SessionReport {
    pub sync: SyncReport,
    pub source_files: Vec<String>,
    pub containerization_ready: bool,
}

impl SessionReport {
    /// Source files present but nothing to build a container from.
    pub fn needs_containerization(&self) -> bool {
        !self.source_files.is_empty() && !self.containerization_ready
    }
}

/// The gate for one workspace: configuration, compiled evaluators and the ledger.
pub struct Gate<L: Ledger> {
    root: PathBuf,
    cfg: Config,
    evaluators: EvaluatorSet,
    ledger: L,
}

impl Gate<FsLedger> {
    pub fn open(root: &Path) -> Result<Self> {
        let cfg = Config::load_or_default(root)?;
        let evaluators = cfg.build_evaluators(root)?;
        let ledger = FsLedger::open(root, cfg.ledger_options());
        Ok(Self::with_parts(root, cfg, evaluators, ledger))
    }

    /// Write the default config if none exists and create both ledgers.
    pub fn init_workspace(root: &Path) -> Result<()> {
        let cfg_path = Config::config_path(root);
        let cfg = if cfg_path.exists() {
            Config::load_from(&cfg_path)?
        } else {
            let cfg = Config::default();
            cfg.save_to(&cfg_path)?;
            cfg
        };
        FsLedger::open(root, cfg.ledger_options())
            .init()
            .with_context(|| format!("initialize ledgers in {}", root.display()))?;
        Ok(())
    }
}

impl<L: Ledger> Gate<L> {
    pub fn with_parts(root: &Path, cfg: Config, evaluators: EvaluatorSet, ledger: L) -> Self {
        Self { root: root.to_path_buf(), cfg, evaluators, ledger }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn policy(&self) -> LedgerFailurePolicy {
        self.cfg.ledger.on_error
    }

    /// Rewrite the operation's path relative to the workspace root.
    pub fn relative(&self, mut op: Operation) -> Operation {
        match &mut op.body {
            OperationBody::Write { path, .. }
            | OperationBody::Edit { path, .. }
            | OperationBody::MultiEdit { path, .. } => *path = relative_path(path, &self.root),
            _ => {}
        }
        op
    }

    /// Run the evaluators and aggregate. Touches no ledger.
    pub fn evaluate(&self, op: &Operation) -> Decision {
        let payload = op.payload();
        let max = self.cfg.gate.max_payload_bytes;
        let outputs = if payload.len() > max {
            warn!(bytes = payload.len(), max, "payload over scan limit");
            vec![scan_limit_output(payload.len(), max)]
        } else {
            let target = EvalTarget::new(op, &payload);
            self.evaluators.run(&target, self.cfg.gate.parallel_evaluators)
        };
        let decision = aggregate(&outputs, &self.cfg.aggregation_policy());
        debug!(
            kind = op.kind().as_str(),
            action = decision.action.as_str(),
            category = %decision.category,
            findings = decision.findings.len(),
            "evaluated"
        );
        decision
    }

    /// BLOCK for build or deploy work in a workspace that cannot be containerized yet.
    fn containerization_block(&self, op: &Operation) -> Option<Decision> {
        let gate = &self.cfg.gate;
        if !gate.require_containerization || !gate.describes_container_work(op.description()) {
            return None;
        }
        if has_container_files(&self.root) {
            return None;
        }
        info!(actor = %op.actor, description = op.description(), "containerization required");
        Some(Decision::containerization_required(CONTAINER_ROLE))
    }

    /// Decide one operation before it runs.
    ///
    /// File operations take the resource lock first; a conflict blocks
    /// without running evaluators. A hold this call created is released
    /// again when the decision is BLOCK, and the reason says so if that fails.
    pub fn pre_tool_use(&self, op: &Operation) -> Decision {
        if !op.is_gated() {
            return Decision::not_applicable();
        }
        let policy = self.policy();
        let mut fresh_hold = None;
        let mut ledger_failure = None;

        if let (Some(resource), Some(purpose)) = (op.resource(), op.kind().lock_purpose()) {
            match self.ledger.acquire(resource, &op.actor, purpose) {
                Ok(AcquireOutcome::Conflict(record)) => {
                    info!(resource, holder = %record.holder, actor = %op.actor, "lock conflict");
                    return Decision::lock_conflict(record);
                }
                Ok(AcquireOutcome::Acquired { refreshed, .. }) => {
                    if !refreshed {
                        fresh_hold = Some(resource);
                    }
                }
                Err(e) => {
                    let err = GateError::from(e);
                    warn!(resource, error = %err, ?policy, "lock ledger unavailable");
                    if policy == LedgerFailurePolicy::FailClosed {
                        return policy.decide(&err);
                    }
                    ledger_failure = Some(err);
                }
            }
        }

        let mut decision = match self.containerization_block(op) {
            Some(block) => block,
            None => self.evaluate(op),
        };

        if let Some(err) = ledger_failure {
            // ASK and BLOCK from the evaluators stand; ALLOW becomes the policy answer.
            return if decision.action == Action::Allow { policy.decide(&err) } else { decision };
        }

        if decision.is_block() {
            if let Some(resource) = fresh_hold {
                if let Err(e) = self.ledger.release(resource, &ReleaseBy::Holder(op.actor.clone())) {
                    let err = GateError::from(e);
                    warn!(resource, error = %err, "could not release hold after block");
                    decision.reason.push_str(&format!(
                        "\nThe lock on `{resource}` taken for this check could not be released ({err}); \
                         clear it with `hookgate unlock {resource}`."
                    ));
                }
            }
        }
        decision
    }

    /// Record a finished file operation. Every step is attempted; failures
    /// land in the report.
    pub fn post_tool_use(&self, op: &Operation, success: bool) -> SyncReport {
        let mut report = SyncReport::default();
        let Some(resource) = op.resource() else {
            return report;
        };
        let now = time::now();
        let status = if success { ActivityStatus::Completed } else { ActivityStatus::Failed };

        report.record(
            SyncStep::Activity,
            self.ledger.append(ActivityRecord {
                at: now,
                actor: op.actor.clone(),
                operation: op.kind().as_str().to_string(),
                resource: resource.to_string(),
                status,
                details: op.description.clone(),
            }),
        );

        if let Some(ReleaseOutcome::HeldByOther(record)) =
            report.record(SyncStep::Release, self.ledger.release(resource, &ReleaseBy::Holder(op.actor.clone())))
        {
            debug!(resource, holder = %record.holder, "hold belongs to another actor; left in place");
        }

        let broadcast = broadcast_for(resource, &self.cfg.routes);
        if !broadcast.roles.is_empty() {
            let res = broadcast.roles.iter().try_for_each(|role| {
                self.ledger.update(ProgressRecord {
                    actor: ActorId::new(role.clone()),
                    topic: COORDINATION_TOPIC.to_string(),
                    operation: "coordination_signal".to_string(),
                    resource: resource.to_string(),
                    status: "pending_review".to_string(),
                    updated_at: now,
                })
            });
            if report.record(SyncStep::Broadcast, res).is_some() {
                report.notified_roles = broadcast.roles.clone();
            }
        }
        for (topic, roles) in &broadcast.alerts {
            report.record(
                SyncStep::Alert,
                self.ledger.signal(AlertRecord {
                    topic: topic.clone(),
                    requested_by: op.actor.clone(),
                    roles: roles.clone(),
                    resources: vec![resource.to_string()],
                    raised_at: now,
                }),
            );
        }

        report.record(
            SyncStep::Progress,
            self.ledger.update(ProgressRecord {
                actor: op.actor.clone(),
                topic: PROGRESS_TOPIC.to_string(),
                operation: op.kind().as_str().to_string(),
                resource: resource.to_string(),
                status: status.as_str().to_string(),
                updated_at: now,
            }),
        );

        if report.is_degraded() {
            warn!(resource, failures = report.failures.len(), "coordination sync degraded");
        }
        report
    }

    /// The ledger-failure answer for a degraded sync, if any.
    pub fn sync_decision(&self, report: &SyncReport) -> Option<Decision> {
        if !report.is_degraded() {
            return None;
        }
        let detail = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.step.as_str(), f.error))
            .collect::<Vec<_>>()
            .join("; ");
        Some(self.policy().decide(&GateError::LedgerUnavailable(detail)))
    }

    /// Prepare the ledgers for a new session and note the actor as active.
    pub fn session_start(&self, actor: &ActorId) -> SessionReport {
        let mut sync = SyncReport::default();
        let now = time::now();

        sync.record(SyncStep::LedgerInit, self.ledger.init());
        sync.record(
            SyncStep::Activity,
            self.ledger.append(ActivityRecord {
                at: now,
                actor: actor.clone(),
                operation: "session_start".to_string(),
                resource: String::new(),
                status: ActivityStatus::Initialized,
                details: Some(format!("session initialized at {}", time::format_timestamp(&now))),
            }),
        );
        sync.record(
            SyncStep::Progress,
            self.ledger.update(ProgressRecord {
                actor: actor.clone(),
                topic: PROGRESS_TOPIC.to_string(),
                operation: "session_initialized".to_string(),
                resource: String::new(),
                status: "active".to_string(),
                updated_at: now,
            }),
        );

        let source_files = source_files(&self.root);
        let containerization_ready = has_container_files(&self.root);
        let mut report = SessionReport { sync, source_files, containerization_ready };
        if report.needs_containerization() {
            let res = self.raise_containerization_alert(actor, &report.source_files, now);
            report.sync.record(SyncStep::Alert, res);
        }
        if report.sync.is_degraded() {
            warn!(failures = report.sync.failures.len(), "session start sync degraded");
        }
        report
    }

    fn raise_containerization_alert(
        &self,
        actor: &ActorId,
        files: &[String],
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), LedgerError> {
        if self.ledger.alerts()?.iter().any(|a| a.topic == CONTAINERIZATION_TOPIC) {
            debug!("containerization review already pending");
            return Ok(());
        }
        self.ledger.signal(AlertRecord {
            topic: CONTAINERIZATION_TOPIC.to_string(),
            requested_by: actor.clone(),
            roles: vec![CONTAINER_ROLE.to_string()],
            resources: files.iter().take(LISTED_SOURCES).cloned().collect(),
            raised_at: now,
        })
    }

    pub fn status(&self) -> Result<LedgerSnapshot> {
        self.ledger.snapshot().context("read ledgers")
    }

    pub fn unlock(&self, resource: &str, by: &ReleaseBy) -> Result<ReleaseOutcome> {
        let resource = relative_path(resource, &self.root);
        self.ledger.release(&resource, by).with_context(|| format!("release {resource}"))
    }

    pub fn clear_alerts(&self, topic: Option<&str>) -> Result<usize> {
        self.ledger.clear_alerts(topic).context("clear alerts")
    }
}

fn skipped(rel: &Path) -> bool {
    rel.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
    })
}

/// Source files under `root`, relative and sorted.
pub fn source_files(root: &Path) -> Vec<String> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let mut out = Vec::new();
    for ext in SOURCE_EXTENSIONS {
        let Ok(paths) = glob::glob(&format!("{base}/**/*.{ext}")) else {
            continue;
        };
        for path in paths.filter_map(std::result::Result::ok) {
            let Ok(rel) = path.strip_prefix(root) else { continue };
            if !skipped(rel) {
                out.push(rel.to_string_lossy().into_owned());
            }
        }
    }
    out.sort();
    out.dedup();
    out
}

/// A Dockerfile variant or a compose file in the workspace root.
pub fn has_container_files(root: &Path) -> bool {
    if root.join("docker-compose.yml").exists() || root.join("docker-compose.yaml").exists() {
        return true;
    }
    let base = glob::Pattern::escape(&root.to_string_lossy());
    glob::glob(&format!("{base}/Dockerfile*"))
        .map(|mut paths| paths.any(|p| p.is_ok()))
        .unwrap_or(false)
}
