use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hookgate_core::{category, GateError, InvocationId, SyncReport};
use hookgate_ledger_fs::FsLedger;
use hookgate_protocol::{
    render_reason, render_sync_report, ExitStatus, HookRequest, HookResponse, POST_TOOL_USE, SESSION_START,
};
use hookgate_runner::{resolve_actor, resolve_root, Gate, HookEnv};
use tracing::{error, info, info_span};

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).context("read hook request from stdin")?;
    Ok(input)
}

fn emit(response: &HookResponse) -> Result<i32> {
    println!("{}", response.to_json().context("encode hook response")?);
    Ok(ExitStatus::Processed.code())
}

/// Nothing is written to stdout for a request the gate cannot process.
fn reject(err: &GateError) -> i32 {
    error!(category = err.category(), "{err}");
    eprintln!("hookgate: {err}");
    ExitStatus::from(err).code()
}

fn open_gate(flag: Option<&Path>, env: &HookEnv, req: &HookRequest) -> Result<Gate<FsLedger>, GateError> {
    let root: PathBuf = resolve_root(flag, env, req.cwd.as_deref()).ok_or_else(|| {
        GateError::Config("no workspace root: pass --root, set CLAUDE_PROJECT_DIR, or send `cwd`".to_string())
    })?;
    Gate::open(&root).map_err(|e| GateError::Config(format!("{e:#}")))
}

/// Context response for a coordination sync; a degraded sync carries the
/// ledger-failure answer in front of the step list.
fn sync_response(gate: &Gate<FsLedger>, event: &'static str, headline: &str, report: &SyncReport) -> HookResponse {
    let context = render_sync_report(headline, report);
    match gate.sync_decision(report) {
        Some(d) => HookResponse::context(event, &d.category, format!("{}\n\n{context}", render_reason(&d)), d.is_block()),
        None => HookResponse::context(event, category::CLEAN, context, false),
    }
}

pub fn pre_tool_use(flag: Option<&Path>, env: &HookEnv) -> Result<i32> {
    let _span = info_span!("pre-tool-use", invocation = %InvocationId::generate()).entered();
    let req = match HookRequest::parse(&read_stdin()?) {
        Ok(req) => req,
        Err(e) => return Ok(reject(&e)),
    };
    let gate = match open_gate(flag, env, &req) {
        Ok(gate) => gate,
        Err(e) => return Ok(reject(&e)),
    };
    let actor = resolve_actor(env, req.description(), gate.config());
    let op = match req.to_operation(actor) {
        Ok(op) => gate.relative(op),
        Err(e) => return Ok(reject(&e)),
    };

    let decision = gate.pre_tool_use(&op);
    info!(
        tool = req.tool_name(),
        actor = %op.actor,
        resource = op.resource().unwrap_or(""),
        action = decision.action.as_str(),
        category = %decision.category,
        "pre-tool-use"
    );
    emit(&HookResponse::pre_tool_use(&decision))
}

pub fn post_tool_use(flag: Option<&Path>, env: &HookEnv) -> Result<i32> {
    let _span = info_span!("post-tool-use", invocation = %InvocationId::generate()).entered();
    let req = match HookRequest::parse(&read_stdin()?) {
        Ok(req) => req,
        Err(e) => return Ok(reject(&e)),
    };
    let gate = match open_gate(flag, env, &req) {
        Ok(gate) => gate,
        Err(e) => return Ok(reject(&e)),
    };
    let actor = resolve_actor(env, req.description(), gate.config());
    let op = match req.to_operation(actor) {
        Ok(op) => gate.relative(op),
        Err(e) => return Ok(reject(&e)),
    };
    let Some(resource) = op.resource() else {
        let ctx = format!("`{}` is not tracked by the coordination ledgers.", req.tool_name());
        return emit(&HookResponse::context(POST_TOOL_USE, category::NOT_APPLICABLE, ctx, false));
    };

    let report = gate.post_tool_use(&op, req.succeeded());
    let headline = format!("Recorded {} of `{}` by {}.", op.kind().as_str(), resource, op.actor);
    info!(resource, actor = %op.actor, degraded = report.is_degraded(), "post-tool-use");
    emit(&sync_response(&gate, POST_TOOL_USE, &headline, &report))
}

pub fn session_start(flag: Option<&Path>, env: &HookEnv) -> Result<i32> {
    let _span = info_span!("session-start", invocation = %InvocationId::generate()).entered();
    let req = match HookRequest::parse_event(&read_stdin()?) {
        Ok(req) => req,
        Err(e) => return Ok(reject(&e)),
    };
    let gate = match open_gate(flag, env, &req) {
        Ok(gate) => gate,
        Err(e) => return Ok(reject(&e)),
    };
    let actor = resolve_actor(env, None, gate.config());
    let report = gate.session_start(&actor);

    let mut headline = format!("Session initialized for {actor} in {}.", gate.root().display());
    if report.needs_containerization() {
        headline.push_str(&format!(
            "\nContainerization review requested: {} source file(s) and no Dockerfile or compose file.",
            report.source_files.len()
        ));
    }
    info!(actor = %actor, sources = report.source_files.len(), "session-start");
    emit(&sync_response(&gate, SESSION_START, &headline, &report.sync))
}
