//! Tool System
//!
//! Tools the orchestrator can dispatch, and the text protocol for calling them.
//! Tools are registered up front and invoked by the orchestrator; the
//! registry is the closed set of actions a model may request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// A tool invocation requested by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Named arguments
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,

    /// Id assigned by the orchestrator or the backend
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
            id: None,
        }
    }

    /// Builder-style argument
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// String argument, if present and a string
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Required, non-blank string argument
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.str_arg(key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AgentError::ToolValidation(format!("Missing required parameter: {key}")))
    }

    /// Render as the fenced block the text protocol uses
    pub fn to_block(&self) -> String {
        let json = serde_json::json!({ "tool": self.name, "arguments": self.arguments });
        format!("```tool\n{json}\n```")
    }
}

/// What a tool hands back to the conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Id echoed back in the result
    pub id: Option<String>,

    /// False for domain failures
    pub success: bool,

    /// Output (success message or error sentinel)
    pub output: String,

    /// Machine-readable payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// One declared parameter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type name
    #[serde(rename = "type")]
    pub param_type: String,

    /// What the parameter means
    pub description: String,

    /// Must be present
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    /// A required string parameter, the only kind the clinical tools take
    pub fn required_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: true,
        }
    }
}

/// Declaration sent to the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Registry key
    pub name: String,

    /// Shown to the model
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Whether tool has side effects outside the run
    #[serde(default)]
    pub has_side_effects: bool,
}

/// A named, schema-described capability
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameters
    fn schema(&self) -> ToolSchema;

    /// Run the tool. Domain failures come back as a failed `ToolResult`, not an `Err`.
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments before execution
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            match call.arguments.get(&param.name) {
                None if param.required => {
                    return Err(AgentError::ToolValidation(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                Some(value) if param.param_type == "string" && !value.is_string() => {
                    return Err(AgentError::ToolValidation(format!(
                        "Parameter '{}' must be a string",
                        param.name
                    )));
                }
                _ => {}
            }
        }

        if let Some(unknown) = call
            .arguments
            .keys()
            .find(|k| !schema.parameters.iter().any(|p| &p.name == *k))
        {
            return Err(AgentError::ToolValidation(format!(
                "Unknown parameter: {unknown}"
            )));
        }

        Ok(())
    }
}

/// The closed set of tools a run may call
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name, Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Validate and execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;

        tool.execute(call).await
    }

    /// All tool schemas, sorted by name
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<_> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Count of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool listing appended to the system prompt
    pub fn generate_prompt_section(&self) -> String {
        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("Use a tool by responding with a JSON block (one block per call):\n\n");
        prompt.push_str(
            "```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n",
        );

        for schema in self.schemas() {
            prompt.push_str(&format!("### {}\n", schema.name));
            prompt.push_str(&format!("{}\n", schema.description));

            if !schema.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    prompt.push_str(&format!(
                        "- `{}` ({}){}: {}\n",
                        param.name, param.param_type, required, param.description
                    ));
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}

/// Extract every ```tool block from a model response, in order
///
/// Falls back to a single inline JSON object carrying a `"tool"` key when no
/// fenced block is present. Blocks that fail to parse are skipped.
pub fn parse_tool_calls(content: &str) -> Vec<ToolCall> {
    const TOOL_START: &str = "```tool";
    const TOOL_END: &str = "```";

    let mut calls = Vec::new();
    let mut rest = content;

    while let Some(start_idx) = rest.find(TOOL_START) {
        let after_marker = &rest[start_idx + TOOL_START.len()..];
        let Some(end_idx) = after_marker.find(TOOL_END) else {
            break;
        };
        let json_str = after_marker[..end_idx].trim();
        match serde_json::from_str::<ToolCall>(json_str) {
            Ok(call) => calls.push(call),
            Err(e) => tracing::debug!(error = %e, "Skipping malformed tool block"),
        }
        rest = &after_marker[end_idx + TOOL_END.len()..];
    }

    if calls.is_empty() {
        calls.extend(parse_inline_tool_call(content));
    }

    for call in &mut calls {
        if call.id.is_none() {
            call.id = Some(uuid::Uuid::new_v4().to_string());
        }
    }

    calls
}

fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;

    if end <= start {
        return None;
    }

    serde_json::from_str::<ToolCall>(&content[start..=end]).ok()
}
