use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hookgate_core::{time, ActorId, ReleaseBy, ReleaseOutcome};
use hookgate_runner::{all_ok, doctor, Gate, HookEnv};

mod hooks;

#[derive(Parser)]
#[command(name = "hookgate", version)]
struct Cli {
    /// Workspace root (default: $CLAUDE_PROJECT_DIR, then the request's cwd or the current dir)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide a tool call before it runs (hook request on stdin)
    PreToolUse,

    /// Record a finished tool call in the ledgers (hook request on stdin)
    PostToolUse,

    /// Prepare the ledgers for a new session (hook request on stdin)
    SessionStart,

    /// Write the default config and create both ledgers
    Init,

    /// Check config, rule tables and ledgers
    Doctor,

    /// Show locks, recent activity, progress and pending alerts
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Release a file lock held by this agent
    Unlock {
        path: String,
        /// Release regardless of holder
        #[arg(long)]
        force: bool,
    },

    /// Manage coordination alerts
    Alerts {
        #[command(subcommand)]
        cmd: AlertsCommand,
    },
}

#[derive(Subcommand)]
enum AlertsCommand {
    /// Clear pending alerts (all, or one topic)
    Clear {
        #[arg(long)]
        topic: Option<String>,
    },
}

fn admin_root(flag: Option<&Path>, env: &HookEnv) -> anyhow::Result<PathBuf> {
    match flag.map(Path::to_path_buf).or_else(|| env.project_dir.clone()) {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("current dir"),
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let env = HookEnv::from_env();
    let flag = cli.root.as_deref();

    match cli.cmd {
        Command::PreToolUse => return hooks::pre_tool_use(flag, &env),
        Command::PostToolUse => return hooks::post_tool_use(flag, &env),
        Command::SessionStart => return hooks::session_start(flag, &env),
        Command::Init => {
            let root = admin_root(flag, &env)?;
            Gate::init_workspace(&root)?;
            println!("Initialized hookgate in {}", root.display());
        }
        Command::Doctor => {
            let root = admin_root(flag, &env)?;
            let checks = doctor(&root);
            for c in &checks {
                println!("{} {:<9} {}", if c.ok { "ok  " } else { "FAIL" }, c.name, c.detail);
            }
            if !all_ok(&checks) {
                return Ok(1);
            }
        }
        Command::Status { json } => {
            let gate = Gate::open(&admin_root(flag, &env)?)?;
            let snap = gate.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snap)?);
                return Ok(0);
            }
            println!("Locks: {}", snap.locks.len());
            for l in &snap.locks {
                println!("- {} by {} ({}) since {}", l.resource, l.holder, l.purpose, time::format_timestamp(&l.acquired_at));
            }
            println!("Recent activities: {}{}", snap.activities.len(), if snap.activities_truncated { " (older trimmed)" } else { "" });
            for a in snap.activities.iter().take(5) {
                println!("- {} {} {} {} [{}]", time::format_timestamp(&a.at), a.actor, a.operation, a.resource, a.status.as_str());
            }
            println!("Progress: {}", snap.progress.len());
            for p in &snap.progress {
                println!("- {} / {}: {} {} [{}]", p.actor, p.topic, p.operation, p.resource, p.status);
            }
            println!("Pending alerts: {}", snap.alerts.len());
            for a in &snap.alerts {
                println!("- {} from {} for {}: {}", a.topic, a.requested_by, a.roles.join(", "), a.resources.join(", "));
            }
        }
        Command::Unlock { path, force } => {
            let gate = Gate::open(&admin_root(flag, &env)?)?;
            let by = if force {
                ReleaseBy::Override
            } else {
                let me = env.agent_name.clone().unwrap_or_else(|| gate.config().actor.default.clone());
                ReleaseBy::Holder(ActorId::new(me))
            };
            match gate.unlock(&path, &by)? {
                ReleaseOutcome::Released(r) => println!("Released {} (held by {})", r.resource, r.holder),
                ReleaseOutcome::NotHeld => println!("{path} is not locked"),
                ReleaseOutcome::HeldByOther(r) => {
                    println!("{} is held by {}; use --force to release it anyway", r.resource, r.holder);
                    return Ok(1);
                }
            }
        }
        Command::Alerts { cmd: AlertsCommand::Clear { topic } } => {
            let gate = Gate::open(&admin_root(flag, &env)?)?;
            let n = gate.clear_alerts(topic.as_deref())?;
            println!("Cleared {n} alert(s)");
        }
    }

    Ok(0)
}

fn main() {
    // stdout carries the hook response; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("hookgate: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
