use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_core::mock::ScriptedProvider;
use agent_core::{
    AgentBuilder, AgentError, BackoffConfig, GenerationOptions, ModelGateway, ParameterSchema,
    Role, Tool, ToolCall, ToolResult, ToolSchema,
};
use async_trait::async_trait;

/// Records every execution into a shared log
struct LoggingTool {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    delay: Duration,
}

impl LoggingTool {
    fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            log: log.clone(),
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl Tool for LoggingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.into(),
            description: format!("Test tool {}", self.name),
            parameters: vec![ParameterSchema {
                name: "note".into(),
                param_type: "string".into(),
                description: "Free text".into(),
                required: false,
            }],
            has_side_effects: true,
        }
    }

    async fn execute(&self, _call: &ToolCall) -> agent_core::Result<ToolResult> {
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push(self.name.to_string());
        Ok(ToolResult::success(self.name, format!("{} ok", self.name)))
    }
}

fn call(name: &str) -> String {
    ToolCall::new(name).to_block()
}

fn gateway(provider: ScriptedProvider) -> ModelGateway {
    ModelGateway::new(Arc::new(provider), GenerationOptions::default())
        .with_backoff(BackoffConfig::none())
}

fn builder(provider: ScriptedProvider, log: &Arc<Mutex<Vec<String>>>) -> AgentBuilder {
    AgentBuilder::new()
        .gateway(gateway(provider))
        .tool(LoggingTool::new("order", log))
        .tool(LoggingTool::new("notify", log))
        .tool(LoggingTool::new("lookup", log))
        .terminal_tool("notify", 3)
        .obligation("order", "notify")
        .max_turns(8)
}

#[tokio::test]
async fn plain_text_forever_stalls_at_turn_ceiling() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = Arc::new(ScriptedProvider::constant("Thinking about it..."));
    let agent = AgentBuilder::new()
        .gateway(
            ModelGateway::new(provider.clone(), GenerationOptions::default())
                .with_backoff(BackoffConfig::none()),
        )
        .tool(LoggingTool::new("notify", &log))
        .terminal_tool("notify", 3)
        .max_turns(5)
        .build()
        .unwrap();

    let (conversation, result) = agent.execute("task").await;

    match result {
        Err(AgentError::Stalled { turns, reason }) => {
            assert_eq!(turns, 5);
            assert!(reason.contains("turn ceiling"));
        }
        other => panic!("expected Stalled, got {other:?}"),
    }
    assert_eq!(provider.calls(), 5);
    assert!(log.lock().unwrap().is_empty());
    // system + task + five assistant replies
    assert_eq!(conversation.len(), 7);
}

#[tokio::test]
async fn without_terminal_tool_first_plain_reply_ends_run() {
    let agent = AgentBuilder::new()
        .gateway(gateway(ScriptedProvider::constant("Nothing to do.")))
        .build()
        .unwrap();

    let (_, result) = agent.execute("task").await;
    let report = result.unwrap();
    assert_eq!(report.turns, 1);
    assert_eq!(report.final_response, "Nothing to do.");
    assert!(report.invocations.is_empty());
}

#[tokio::test]
async fn notification_then_plain_text_reaches_end() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = ScriptedProvider::sequence(vec![call("notify"), "All done.".into()]);
    let agent = builder(provider, &log).build().unwrap();

    let (conversation, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(report.turns, 2);
    assert_eq!(report.calls_to("notify"), 1);
    assert_eq!(*log.lock().unwrap(), vec!["notify"]);
    assert_eq!(conversation.last().map(|m| m.role), Some(Role::Assistant));
}

#[tokio::test]
async fn ordered_test_blocks_end_until_notification() {
    let log = Arc::new(Mutex::new(Vec::new()));
    // The model first notifies, then orders and tries to stop without a
    // second notification.
    let provider = ScriptedProvider::sequence(vec![
        call("notify"),
        call("order"),
        "Finished.".into(),
        call("notify"),
        "Finished.".into(),
    ]);
    let agent = builder(provider, &log).build().unwrap();

    let (conversation, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["notify", "order", "notify"]);
    assert_eq!(report.turns, 5);

    let reminders: Vec<_> = conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::User && m.content.starts_with("Reminder"))
        .collect();
    assert_eq!(reminders.len(), 1);
    assert!(reminders[0].content.contains("`notify`"));
}

#[tokio::test]
async fn notification_outside_lookback_window_does_not_end_run() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = ScriptedProvider::sequence(vec![
        call("notify"),
        call("lookup"),
        "Done.".into(),
    ]);
    let agent = builder(provider, &log).max_turns(4).build().unwrap();

    let (_, result) = agent.execute("task").await;
    assert!(matches!(result, Err(AgentError::Stalled { turns: 4, .. })));
}

#[tokio::test]
async fn multiple_calls_in_one_turn_run_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = ScriptedProvider::sequence(vec![
        format!("{}\n{}\n{}", call("lookup"), call("order"), call("notify")),
        "Done.".into(),
    ]);
    let agent = builder(provider, &log).build().unwrap();

    let (_, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["lookup", "order", "notify"]);
    assert!(report.invocations.iter().all(|i| i.turn == 1));
    assert_eq!(report.turns, 2);
}

#[tokio::test]
async fn repeated_terminal_call_in_one_turn_is_refused() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = ScriptedProvider::sequence(vec![
        format!("{}\n{}\n{}", call("order"), call("notify"), call("notify")),
        "Done.".into(),
    ]);
    let agent = builder(provider, &log).build().unwrap();

    let (conversation, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["order", "notify"]);
    assert_eq!(report.calls_to("notify"), 2);
    assert_eq!(report.successes_of("notify"), 1);
    assert!(!report.invocations[2].result.success);
    assert!(report.invocations[2].result.output.contains("already succeeded"));
    assert_eq!(report.turns, 2);
    assert!(
        conversation
            .messages()
            .iter()
            .any(|m| m.role == Role::Tool && m.content.starts_with("[Tool 'notify' failed]"))
    );
}

#[tokio::test]
async fn refused_repeat_lets_run_finish() {
    let log = Arc::new(Mutex::new(Vec::new()));
    // The first notification slides out of the window; the model tries to
    // send it again, is refused, and then stops.
    let provider = ScriptedProvider::sequence(vec![
        call("notify"),
        call("lookup"),
        call("notify"),
        "Done.".into(),
    ]);
    let agent = builder(provider, &log).build().unwrap();

    let (_, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["notify", "lookup"]);
    assert_eq!(report.successes_of("notify"), 1);
    assert_eq!(report.turns, 4);
}

#[tokio::test]
async fn new_order_permits_another_notification() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = ScriptedProvider::sequence(vec![
        call("notify"),
        format!("{}\n{}", call("order"), call("notify")),
        "Done.".into(),
    ]);
    let agent = builder(provider, &log).build().unwrap();

    let (_, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["notify", "order", "notify"]);
    assert_eq!(report.successes_of("notify"), 2);
}

#[tokio::test]
async fn notification_on_last_permitted_turn_completes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = Arc::new(ScriptedProvider::sequence(vec![
        call("order"),
        call("notify"),
        "Done.".into(),
    ]));
    let agent = AgentBuilder::new()
        .gateway(
            ModelGateway::new(provider.clone(), GenerationOptions::default())
                .with_backoff(BackoffConfig::none()),
        )
        .tool(LoggingTool::new("order", &log))
        .tool(LoggingTool::new("notify", &log))
        .terminal_tool("notify", 3)
        .obligation("order", "notify")
        .max_turns(2)
        .build()
        .unwrap();

    let (_, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(report.turns, 2);
    assert_eq!(provider.calls(), 2);
    assert_eq!(*log.lock().unwrap(), vec!["order", "notify"]);
}

#[tokio::test]
async fn unknown_tool_is_rejected_and_fed_back() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = ScriptedProvider::sequence(vec![
        call("delete_records"),
        call("notify"),
        "Done.".into(),
    ]);
    let agent = builder(provider, &log).build().unwrap();

    let (conversation, result) = agent.execute("task").await;
    let report = result.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["notify"]);
    let rejected = &report.invocations[0];
    assert_eq!(rejected.call.name, "delete_records");
    assert!(!rejected.result.success);
    assert!(
        conversation
            .messages()
            .iter()
            .any(|m| m.role == Role::Tool && m.content.contains("Tool not found: delete_records"))
    );
}

#[tokio::test]
async fn wall_clock_deadline_stalls_run() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut slow = LoggingTool::new("lookup", &log);
    slow.delay = Duration::from_millis(300);

    let agent = AgentBuilder::new()
        .gateway(gateway(ScriptedProvider::constant(call("lookup"))))
        .tool(slow)
        .tool(LoggingTool::new("notify", &log))
        .terminal_tool("notify", 3)
        .deadline(Duration::from_millis(50))
        .build()
        .unwrap();

    let (_, result) = agent.execute("task").await;
    match result {
        Err(AgentError::Stalled { turns, reason }) => {
            assert_eq!(turns, 1);
            assert!(reason.contains("deadline"));
        }
        other => panic!("expected Stalled, got {other:?}"),
    }
}

#[test]
fn builder_validates_policy_tools() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let missing_gateway = AgentBuilder::new().build();
    assert!(matches!(missing_gateway, Err(AgentError::Config(_))));

    let bad_terminal = AgentBuilder::new()
        .gateway(gateway(ScriptedProvider::constant("x")))
        .tool(LoggingTool::new("order", &log))
        .terminal_tool("notify", 3)
        .build();
    assert!(matches!(bad_terminal, Err(AgentError::Config(_))));

    let zero_turns = AgentBuilder::new()
        .gateway(gateway(ScriptedProvider::constant("x")))
        .max_turns(0)
        .build();
    assert!(matches!(zero_turns, Err(AgentError::Config(_))));
}
