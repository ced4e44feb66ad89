//! # agent-core
//!
//! Provider-agnostic orchestration core: a bounded state machine that lets a
//! language model pick the next tool from a closed registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Agent (orchestrator)                     │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Agent/Tools │  │    Tools    │  │    ModelGateway     │  │
//! │  │  /End loop  │──│   Registry  │──│ (timeout + backoff) │  │
//! │  └─────────────┘  └─────────────┘  └──────────┬──────────┘  │
//! │                                               │             │
//! │                                    ┌──────────▼──────────┐  │
//! │                                    │ LlmProvider (trait) │  │
//! │                                    └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Gemini, Ollama or a
//! scripted test double without changing orchestration logic.

pub mod error;
pub mod gateway;
pub mod message;
pub mod mock;
pub mod provider;
pub mod reasoning;
pub mod run;
pub mod tool;

pub use error::{AgentError, Result};
pub use gateway::{BackoffConfig, ModelGateway};
pub use message::{Conversation, Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentState, RunLimits};
pub use run::{Invocation, RunId, RunReport, RunStatus};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
