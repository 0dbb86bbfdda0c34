use hookgate_core::{Action, Decision, GateError, LockRecord};
use serde::Serialize;

use crate::reason::render_reason;

pub const PRE_TOOL_USE: &str = "PreToolUse";
pub const POST_TOOL_USE: &str = "PostToolUse";
pub const SESSION_START: &str = "SessionStart";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Response written to stdout for every processed request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    pub hook_specific_output: HookSpecificOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub suppress_output: bool,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<LockRecord>,
}

pub fn permission_decision(action: Action) -> &'static str {
    match action {
        Action::Allow => "allow",
        Action::Ask => "ask",
        Action::Block => "deny",
    }
}

impl HookResponse {
    pub fn pre_tool_use(decision: &Decision) -> Self {
        let reason = render_reason(decision);
        let block = decision.is_block();
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: PRE_TOOL_USE,
                permission_decision: Some(permission_decision(decision.action)),
                permission_decision_reason: Some(reason.clone()),
                additional_context: None,
            },
            decision: block.then_some("block"),
            reason: block.then_some(reason),
            suppress_output: decision.suppress_output,
            category: decision.category.clone(),
            conflict: decision.conflict.clone(),
        }
    }

    /// Context-only response for post-tool-use and session-start. With
    /// `blocked` set, the context is also returned as a blocking reason.
    pub fn context(event: &'static str, category: &str, context: String, blocked: bool) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: event,
                permission_decision: None,
                permission_decision_reason: None,
                additional_context: Some(context.clone()),
            },
            decision: blocked.then_some("block"),
            reason: blocked.then_some(context),
            suppress_output: !blocked,
            category: category.to_string(),
            conflict: None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Process exit status. The decision travels in the response body, so
/// anything that produced a response exits zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Processed,
    Unprocessable,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Processed => 0,
            ExitStatus::Unprocessable => 1,
        }
    }
}

impl From<&GateError> for ExitStatus {
    fn from(_: &GateError) -> Self {
        ExitStatus::Unprocessable
    }
}
