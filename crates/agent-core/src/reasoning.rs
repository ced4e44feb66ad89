//! Orchestrator
//!
//! Drives a run as a small state machine:
//!
//! ```text
//!  start ──► Agent ──(tool calls)──► Tools
//!              ▲  │                    │
//!              │  └─(no calls, done)─► End
//!              └──────────────────────┘
//! ```
//!
//! The model only *advises*: its response is parsed into [`ToolCall`]s that
//! are validated against the registry before anything runs. Every run is
//! bounded by a turn ceiling and a wall-clock deadline; exhausting either
//! yields [`AgentError::Stalled`].
//!
//! The terminal tool runs once per discharge: after it has succeeded and no
//! obligation asks for it again, further calls are refused without executing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::Instrument;

use crate::error::{AgentError, Result};
use crate::gateway::ModelGateway;
use crate::message::{Conversation, Message};
use crate::provider::GenerationOptions;
use crate::run::{Invocation, RunId, RunReport, RunStatus};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult, parse_tool_calls};

/// Orchestrator states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    /// The model is deciding the next action
    Agent,
    /// Requested tools are being executed
    Tools,
    /// Terminal
    End,
}

/// A tool whose successful execution obliges another tool to follow
#[derive(Clone, Debug)]
pub struct Obligation {
    pub trigger: String,
    pub requires: String,
}

/// When a plain-text response may end the run
#[derive(Clone, Debug)]
pub struct CompletionPolicy {
    /// Tool whose successful result must appear in the recent window.
    /// `None` ends the run on the first response without tool calls.
    pub terminal_tool: Option<String>,

    /// How many trailing messages are searched for the terminal tool
    pub lookback: usize,

    /// Follow-ups that must be discharged before `End`
    pub obligations: Vec<Obligation>,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            terminal_tool: None,
            lookback: 3,
            obligations: Vec::new(),
        }
    }
}

/// Hard bounds on a run
#[derive(Clone, Debug)]
pub struct RunLimits {
    /// Maximum model decisions per run
    pub max_turns: usize,
    /// Wall-clock budget for the whole run
    pub deadline: Duration,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_turns: 16,
            deadline: Duration::from_secs(300),
        }
    }
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Base instructions
    pub system_prompt: String,

    pub limits: RunLimits,

    pub completion: CompletionPolicy,

    /// Append the tool listing to the system prompt
    pub inject_tool_descriptions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            limits: RunLimits::default(),
            completion: CompletionPolicy::default(),
            inject_tool_descriptions: true,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a workflow agent that completes tasks by calling tools.

To call a tool, reply with a fenced block like this:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, decide the next step.
Only call the tools listed below. Be concise and accurate."#;

/// Mutable bookkeeping for one run, kept outside the deadline future so it
/// survives cancellation.
#[derive(Debug, Default)]
struct RunProgress {
    turns: usize,
    invocations: Vec<Invocation>,
    outstanding: Vec<String>,
    final_response: String,
    /// The terminal tool has succeeded since the last obligation was raised
    terminal_done: bool,
    /// Conversation index of the latest refused terminal call
    refused_at: Option<usize>,
}

impl RunProgress {
    fn record(&mut self, turn: usize, call: ToolCall, result: ToolResult, policy: &CompletionPolicy) {
        if result.success {
            self.outstanding.retain(|t| *t != call.name);
            if policy.terminal_tool.as_deref() == Some(call.name.as_str()) {
                self.terminal_done = true;
            }
            for o in policy.obligations.iter().filter(|o| o.trigger == call.name) {
                if !self.outstanding.contains(&o.requires) {
                    self.outstanding.push(o.requires.clone());
                }
                if policy.terminal_tool.as_deref() == Some(o.requires.as_str()) {
                    self.terminal_done = false;
                }
            }
        }
        self.invocations.push(Invocation { turn, call, result });
    }

    /// A repeat of the terminal tool that nothing outstanding asks for
    fn is_redundant(&self, call: &ToolCall, policy: &CompletionPolicy) -> bool {
        self.terminal_done
            && policy.terminal_tool.as_deref() == Some(call.name.as_str())
            && !self.outstanding.contains(&call.name)
    }
}

/// The orchestrator
pub struct Agent {
    gateway: ModelGateway,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub const fn new(gateway: ModelGateway, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            gateway,
            tools,
            config,
        }
    }

    fn native_tools(&self) -> bool {
        self.gateway.provider().supports_native_tools()
    }

    /// System prompt plus the tool listing
    fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    fn generation_options(&self) -> GenerationOptions {
        let options = self.gateway.options().clone();
        if self.native_tools() {
            options.with_tools(self.tools.schemas())
        } else {
            options
        }
    }

    /// Fresh conversation: system prompt followed by the task preamble
    pub fn start(&self, task: impl Into<String>) -> Conversation {
        let mut conversation = Conversation::with_system_prompt(self.build_system_prompt());
        conversation.push(Message::user(task));
        conversation
    }

    /// Drive a prepared conversation to `End`
    ///
    /// The conversation stays with the caller, so the transcript is available
    /// even when the run fails or stalls.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<RunReport> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let mut progress = RunProgress::default();
        let deadline = self.config.limits.deadline;

        let span = tracing::info_span!("run", run_id = %run_id);
        let outcome = tokio::time::timeout(deadline, self.drive(conversation, &mut progress))
            .instrument(span)
            .await;

        match outcome {
            Ok(Ok(())) => {
                tracing::info!(run_id = %run_id, turns = progress.turns, "Run completed");
                Ok(RunReport {
                    run_id,
                    status: RunStatus::Completed,
                    turns: progress.turns,
                    invocations: progress.invocations,
                    final_response: progress.final_response,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Ok(Err(e)) => {
                tracing::error!(run_id = %run_id, turns = progress.turns, error = %e, "Run ended with error");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(run_id = %run_id, turns = progress.turns, "Run deadline exceeded");
                Err(AgentError::Stalled {
                    turns: progress.turns,
                    reason: format!("wall-clock deadline of {}s exceeded", deadline.as_secs_f64()),
                })
            }
        }
    }

    /// Start and run a task in one call
    pub async fn execute(&self, task: impl Into<String>) -> (Conversation, Result<RunReport>) {
        let mut conversation = self.start(task);
        let result = self.run(&mut conversation).await;
        (conversation, result)
    }

    async fn drive(&self, conversation: &mut Conversation, progress: &mut RunProgress) -> Result<()> {
        let options = self.generation_options();
        let mut state = AgentState::Agent;
        let mut pending: Vec<ToolCall> = Vec::new();

        loop {
            match state {
                AgentState::Agent => {
                    if progress.turns >= self.config.limits.max_turns {
                        // The last permitted turn may itself have discharged the run.
                        if self.config.completion.terminal_tool.is_some()
                            && self.is_complete(conversation, progress)
                        {
                            tracing::info!(turns = progress.turns, "Completed on the final turn");
                            state = AgentState::End;
                            continue;
                        }
                        return Err(AgentError::Stalled {
                            turns: progress.turns,
                            reason: format!(
                                "turn ceiling of {} reached",
                                self.config.limits.max_turns
                            ),
                        });
                    }
                    progress.turns += 1;

                    let completion = self
                        .gateway
                        .complete(conversation.messages(), &options)
                        .await?;

                    let calls = if completion.tool_calls.is_empty() {
                        parse_tool_calls(&completion.content)
                    } else {
                        completion.tool_calls
                    };

                    let mut content = completion.content;
                    if self.native_tools() {
                        for call in &calls {
                            content.push('\n');
                            content.push_str(&call.to_block());
                        }
                    }
                    let requested: Vec<String> = calls.iter().map(|c| c.name.clone()).collect();
                    conversation.push(
                        Message::assistant(content.trim()).with_requested_tools(requested.clone()),
                    );

                    if calls.is_empty() {
                        progress.final_response = content.trim().to_string();
                        if self.is_complete(conversation, progress) {
                            state = AgentState::End;
                        } else if let Some(reminder) = self.reminder(progress) {
                            tracing::info!(turn = progress.turns, "Obligations outstanding, reminding agent");
                            conversation.push(Message::user(reminder));
                        } else {
                            tracing::debug!(turn = progress.turns, "Agent thinking");
                        }
                    } else {
                        tracing::info!(turn = progress.turns, tools = ?requested, "Agent using tools");
                        pending = calls;
                        state = AgentState::Tools;
                    }
                }
                AgentState::Tools => {
                    for mut call in pending.drain(..) {
                        if call.id.is_none() {
                            call.id = Some(uuid::Uuid::new_v4().to_string());
                        }
                        let result = if progress.is_redundant(&call, &self.config.completion) {
                            tracing::warn!(tool = %call.name, "Refusing repeat of terminal tool");
                            progress.refused_at = Some(conversation.len());
                            let mut refused = ToolResult::failure(
                                call.name.clone(),
                                format!(
                                    "Error: `{}` already succeeded in this run and nothing requires it again. \
                                     Reply without tool calls to finish.",
                                    call.name
                                ),
                            );
                            refused.id.clone_from(&call.id);
                            refused
                        } else {
                            self.execute_tool(&call).await
                        };
                        conversation.push(Message::tool(
                            &result.name,
                            Self::format_tool_result(&result),
                            call.id.clone(),
                            result.success,
                        ));
                        progress.record(progress.turns, call, result, &self.config.completion);
                    }
                    state = AgentState::Agent;
                }
                AgentState::End => return Ok(()),
            }
        }
    }

    /// Whether the run may end: no obligation pending and the terminal tool
    /// succeeded (or a repeat of it was refused) within the lookback window
    fn is_complete(&self, conversation: &Conversation, progress: &RunProgress) -> bool {
        let policy = &self.config.completion;
        if !progress.outstanding.is_empty() {
            return false;
        }
        let window_start = conversation.len().saturating_sub(policy.lookback);
        policy.terminal_tool.as_deref().is_none_or(|tool| {
            conversation
                .recent(policy.lookback)
                .iter()
                .any(|m| m.is_success_of(tool))
                || progress.refused_at.is_some_and(|at| at >= window_start)
        })
    }

    fn reminder(&self, progress: &RunProgress) -> Option<String> {
        let owed = progress.outstanding.first()?;
        let trigger = self
            .config
            .completion
            .obligations
            .iter()
            .find(|o| &o.requires == owed)
            .map_or("a previous action", |o| o.trigger.as_str());
        Some(format!(
            "Reminder: `{trigger}` was executed, so you must call `{owed}` before finishing."
        ))
    }

    /// Execute a tool call; registry errors become failed results
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        tracing::debug!(tool = %call.name, "Executing tool");
        let mut result = match self.tools.execute(call).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call rejected");
                ToolResult::failure(call.name.clone(), format!("Error: {e}"))
            }
        };
        result.id.clone_from(&call.id);
        if !result.success {
            tracing::warn!(tool = %call.name, output = %result.output, "Tool reported failure");
        }
        result
    }

    /// Text the model sees for a tool result
    fn format_tool_result(result: &ToolResult) -> String {
        if result.success {
            format!("[Tool '{}' returned]\n{}", result.name, result.output)
        } else {
            format!("[Tool '{}' failed]\n{}", result.name, result.output)
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Assembles an [`Agent`]
pub struct AgentBuilder {
    gateway: Option<ModelGateway>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            gateway: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn gateway(mut self, gateway: ModelGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub const fn max_turns(mut self, max: usize) -> Self {
        self.config.limits.max_turns = max;
        self
    }

    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.config.limits.deadline = deadline;
        self
    }

    /// End only after this tool succeeded within the last `lookback` messages
    #[must_use]
    pub fn terminal_tool(mut self, tool: impl Into<String>, lookback: usize) -> Self {
        self.config.completion.terminal_tool = Some(tool.into());
        self.config.completion.lookback = lookback;
        self
    }

    /// A successful `trigger` must be followed by a successful `requires`
    #[must_use]
    pub fn obligation(mut self, trigger: impl Into<String>, requires: impl Into<String>) -> Self {
        self.config.completion.obligations.push(Obligation {
            trigger: trigger.into(),
            requires: requires.into(),
        });
        self
    }

    pub fn build(self) -> Result<Agent> {
        let gateway = self
            .gateway
            .ok_or_else(|| AgentError::Config("Model gateway is required".into()))?;

        if self.config.limits.max_turns == 0 {
            return Err(AgentError::Config("max_turns must be at least 1".into()));
        }

        let registered = |name: &str| self.tools.get(name).is_some();
        if let Some(tool) = &self.config.completion.terminal_tool {
            if !registered(tool) {
                return Err(AgentError::Config(format!(
                    "Terminal tool '{tool}' is not registered"
                )));
            }
        }
        for o in &self.config.completion.obligations {
            if !registered(&o.trigger) || !registered(&o.requires) {
                return Err(AgentError::Config(format!(
                    "Obligation {} -> {} names an unregistered tool",
                    o.trigger, o.requires
                )));
            }
        }

        Ok(Agent::new(gateway, Arc::new(self.tools), self.config))
    }
}
