use hookgate_core::{ActorId, EditPair, GateError, Operation, OperationBody};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Hook request as the host sends it on stdin. Unknown fields are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct HookRequest {
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: ToolInput,
    #[serde(default)]
    pub tool_response: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default, alias = "filePath")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub old_string: Option<String>,
    #[serde(default)]
    pub new_string: Option<String>,
    #[serde(default)]
    pub edits: Vec<EditInput>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EditInput {
    #[serde(default)]
    pub old_string: String,
    #[serde(default)]
    pub new_string: String,
}

impl HookRequest {
    /// Parse a pre/post tool-use request. `tool_name` is required.
    pub fn parse(input: &str) -> Result<Self, GateError> {
        let req = Self::parse_event(input)?;
        match req.tool_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(req),
            _ => Err(GateError::MalformedRequest("missing `tool_name`".to_string())),
        }
    }

    /// Parse any hook event body (session events carry no tool).
    pub fn parse_event(input: &str) -> Result<Self, GateError> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| GateError::MalformedRequest(format!("invalid JSON: {e}")))?;
        if !value.is_object() {
            return Err(GateError::MalformedRequest("request body must be a JSON object".to_string()));
        }
        let req: Self = serde_json::from_value(value).map_err(|e| GateError::MalformedRequest(e.to_string()))?;
        debug!(
            event = req.hook_event_name.as_deref().unwrap_or(""),
            tool = req.tool_name(),
            session = req.session_id.as_deref().unwrap_or(""),
            "hook request"
        );
        Ok(req)
    }

    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    pub fn description(&self) -> Option<&str> {
        self.tool_input.description.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// Whether the tool reported success. Absent means success.
    pub fn succeeded(&self) -> bool {
        match &self.tool_response {
            Some(Value::Object(map)) => map.get("success").and_then(Value::as_bool).unwrap_or(true),
            _ => true,
        }
    }

    /// Build the typed operation. File tools without a path, and `Bash`
    /// without a command, are malformed.
    pub fn to_operation(&self, actor: ActorId) -> Result<Operation, GateError> {
        let input = &self.tool_input;
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let body = match self.tool_name() {
            "Write" => OperationBody::Write {
                path: required_path(self.tool_name(), input)?,
                content: text(&input.content),
            },
            "Edit" => OperationBody::Edit {
                path: required_path(self.tool_name(), input)?,
                old: text(&input.old_string),
                new: text(&input.new_string),
            },
            "MultiEdit" => OperationBody::MultiEdit {
                path: required_path(self.tool_name(), input)?,
                edits: input
                    .edits
                    .iter()
                    .map(|e| EditPair { old: e.old_string.clone(), new: e.new_string.clone() })
                    .collect(),
            },
            "Bash" => OperationBody::Run {
                command: input
                    .command
                    .clone()
                    .ok_or_else(|| GateError::MalformedRequest("`Bash` request without `command`".to_string()))?,
            },
            "Task" => OperationBody::Delegate { prompt: text(&input.prompt) },
            other => {
                debug!(tool = other, "tool is not gated");
                OperationBody::Other { tool: other.to_string() }
            }
        };
        let op = Operation::new(actor, body);
        Ok(match self.description() {
            Some(d) => op.with_description(d),
            None => op,
        })
    }
}

fn required_path(tool: &str, input: &ToolInput) -> Result<String, GateError> {
    match input.file_path.as_deref() {
        Some(p) if !p.trim().is_empty() => Ok(p.to_string()),
        _ => Err(GateError::MalformedRequest(format!("`{tool}` request without `file_path`"))),
    }
}
