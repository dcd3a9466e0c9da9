//! Tool framework — functions the model may ask us to run.
//!
//! Tools don't think — they execute. Each tool carries self-documenting
//! metadata (name, description, JSON schema) that is advertised to the
//! model, and the dispatcher routes model-issued calls to them by name.

pub mod documentation;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::llm::types::{ToolCallRequest, ToolDefinition};
use crate::transcript::Message;

/// Errors from tool dispatch. All of them abort the current user turn.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unimplemented function: {0}")]
    UnknownFunction(String),

    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments { function: String, reason: String },
}

impl ToolError {
    /// True for capability gaps, as opposed to bad input from the model.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, ToolError::UnknownFunction(_))
    }
}

/// A function exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name (used in routing).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON schema of the argument object.
    fn parameters(&self) -> serde_json::Value;

    /// Run the tool with already-decoded arguments; returns the tool message text.
    async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.parameters())
    }
}

/// Routes model-issued tool calls to registered tools.
#[derive(Default)]
pub struct ToolDispatcher {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Schemas sent with every main-loop request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Execute one call and wrap its output as a tool message.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> Result<Message, ToolError> {
        let tool = self
            .find(&call.function_name)
            .ok_or_else(|| ToolError::UnknownFunction(call.function_name.clone()))?;

        let arguments = parse_arguments(&call.function_name, &call.arguments)?;
        debug!(id = %call.id, function = %call.function_name, "dispatching tool call");
        let output = tool.call(&arguments).await?;
        Ok(Message::tool(call.id.clone(), output))
    }

    /// Execute calls strictly in order, one tool message per call. Stops at the
    /// first failure.
    pub async fn dispatch_all(&self, calls: &[ToolCallRequest]) -> Result<Vec<Message>, ToolError> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.dispatch(call).await?);
        }
        Ok(results)
    }
}

/// Decode the JSON-encoded argument object. An empty string counts as `{}`.
fn parse_arguments(function: &str, raw: &str) -> Result<serde_json::Value, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        function: function.to_string(),
        reason,
    };
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| invalid(format!("not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(invalid("expected a JSON object".into()));
    }
    Ok(value)
}

/// Fetch a required string field from an argument object.
pub fn required_str<'a>(
    function: &str,
    arguments: &'a serde_json::Value,
    field: &str,
) -> Result<&'a str, ToolError> {
    match arguments.get(field) {
        Some(serde_json::Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ToolError::InvalidArguments {
            function: function.to_string(),
            reason: format!("'{field}' must be a string"),
        }),
        None => Err(ToolError::InvalidArguments {
            function: function.to_string(),
            reason: format!("missing required field '{field}'"),
        }),
    }
}
