//! Conversation Messages
//!
//! Conversation messages shared by the orchestrator and the providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions
    System,
    /// User input (task preamble, reminders)
    User,
    /// Model output
    Assistant,
    /// Tool output fed back to the model
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// One entry in the conversation log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Tool name for tool-result messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Optional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// Tool and model bookkeeping
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Id of the call this result answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Whether the tool call succeeded (for tool messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Tools requested by this response (for assistant messages)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_tools: Vec<String>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// System instructions
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Model turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Result of a tool invocation
    pub fn tool(
        name: impl Into<String>,
        content: impl Into<String>,
        tool_call_id: Option<String>,
        success: bool,
    ) -> Self {
        let mut msg = Self::new(Role::Tool, content).with_name(name);
        msg.metadata = Some(MessageMetadata {
            tool_call_id,
            success: Some(success),
            ..Default::default()
        });
        msg
    }

    /// Tag the message with a sender name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Record which tools an assistant response asked for
    pub fn with_requested_tools(mut self, tools: Vec<String>) -> Self {
        self.metadata.get_or_insert_with(MessageMetadata::default).requested_tools = tools;
        self
    }

    /// Tools requested by this message, if it is an assistant response
    pub fn requested_tools(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map_or(&[], |m| m.requested_tools.as_slice())
    }

    /// Whether this is a successful result of the named tool
    pub fn is_success_of(&self, tool: &str) -> bool {
        self.role == Role::Tool
            && self.name.as_deref() == Some(tool)
            && self
                .metadata
                .as_ref()
                .and_then(|m| m.success)
                .unwrap_or(false)
    }
}

/// Append-only conversation history owned by a single run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::system(prompt));
        conv
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent `n` messages, oldest first
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Render the conversation as a plain-text transcript
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for msg in &self.messages {
            match (&msg.role, &msg.name) {
                (Role::Tool, Some(name)) => out.push_str(&format!("[tool:{name}]\n")),
                (role, _) => out.push_str(&format!("[{role}]\n")),
            }
            out.push_str(msg.content.trim());
            out.push_str("\n\n");
        }
        out.trim_end().to_string()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
