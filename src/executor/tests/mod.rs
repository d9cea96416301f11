//! Execution loop tests.


use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio_util::sync::CancellationToken;

use helpers::{
    FailingHooks, Gauge, Journal, MockLlmClient, RecordingHooks, Scripted, block_call, divide_call,
    sleep_call, test_tools, text, tool_calls,
};

use super::{HookFailurePolicy, LlmExecutor, LlmExecutorConfig};
use crate::client::LlmResponse;
use crate::hooks::HookPhase;
use crate::tools::CallableToolExecutor;
use crate::types::{AgentContext, AgentMessage, Role, ToolCall, ToolErrorKind, ToolSchema};
use crate::Error;

fn executor(client: Arc<MockLlmClient>, config: LlmExecutorConfig) -> LlmExecutor {
    LlmExecutor::new(client, Arc::new(test_tools(Arc::new(Gauge::default())))).with_config(config)
}

fn production() -> LlmExecutorConfig {
    LlmExecutorConfig::new().with_swallow_tool_exceptions(true)
}

fn debug() -> LlmExecutorConfig {
    LlmExecutorConfig::new().with_swallow_tool_exceptions(false)
}

#[tokio::test]
async fn test_final_answer_without_tools() {
    let client = Arc::new(MockLlmClient::replies(vec![text("Hello!")]));
    let ctx = AgentContext::new(vec![AgentMessage::system("be brief"), AgentMessage::user("hi")]);

    let result = executor(Arc::clone(&client), production())
        .run(&ctx)
        .await
        .unwrap();

    assert_eq!(result.iterations, 1);
    assert_eq!(result.final_content.as_deref(), Some("Hello!"));
    assert_eq!(result.messages.len(), 3);
    assert_eq!(result.new_messages().len(), 1);
    assert!(result.is_complete());
    assert_eq!(result.run_id, ctx.run_id);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_context_is_not_mutated() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 10.0, 2.0)]),
        text("5"),
    ]));
    let ctx = AgentContext::from_user("divide 10 by 2");

    let result = executor(client, production()).run(&ctx).await.unwrap();

    assert_eq!(ctx.input_messages.len(), 1);
    assert_eq!(result.messages.len(), 4);
}

#[tokio::test]
async fn test_tool_round_trip() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 10.0, 2.0)]),
        text("The answer is 5."),
    ]));
    let ctx = AgentContext::from_user("divide 10 by 2");

    let result = executor(Arc::clone(&client), production())
        .run(&ctx)
        .await
        .unwrap();

    assert_eq!(result.iterations, 2);
    assert_eq!(result.final_content.as_deref(), Some("The answer is 5."));

    let roles: Vec<Role> = result.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert_eq!(result.messages[2].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(result.messages[2].content, "Result: 5.0");

    let second_request = client.request(1);
    assert_eq!(second_request.len(), 3);
    assert_eq!(second_request[2].role, Role::Tool);
}

#[tokio::test]
async fn test_production_swallows_tool_failure() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 10.0, 0.0)]),
        text("Cannot divide by zero."),
    ]));

    let result = executor(client, production())
        .run(&AgentContext::from_user("divide 10 by 0"))
        .await
        .unwrap();

    assert!(result.error.is_none());
    assert_eq!(result.final_content.as_deref(), Some("Cannot divide by zero."));

    let failure = &result.tool_results()[0];
    assert_eq!(failure.error_kind(), Some(ToolErrorKind::ExecutionFailed));
    assert_eq!(failure.error_message(), Some("division by zero"));

    let tool_message = &result.messages[2];
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_message.content.contains("division by zero"));
}

#[tokio::test]
async fn test_debug_raises_tool_failure() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 10.0, 0.0)]),
        text("unreachable"),
    ]));

    let err = executor(Arc::clone(&client), debug())
        .run(&AgentContext::from_user("divide 10 by 0"))
        .await
        .unwrap_err();

    match err {
        Error::ToolExecution {
            tool,
            call_id,
            source,
        } => {
            assert_eq!(tool, "divide");
            assert_eq!(call_id, "call_1");
            assert_eq!(source.to_string(), "division by zero");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_unknown_tool() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[("call_1", "multiply", json!({"a": 1, "b": 2}))]),
        text("I can't multiply."),
    ]));
    let result = executor(client, production())
        .run(&AgentContext::from_user("multiply"))
        .await
        .unwrap();
    assert_eq!(
        result.tool_results()[0].error_kind(),
        Some(ToolErrorKind::NotFound)
    );

    let client = Arc::new(MockLlmClient::replies(vec![tool_calls(&[(
        "call_1",
        "multiply",
        json!({}),
    )])]));
    let err = executor(client, debug())
        .run(&AgentContext::from_user("multiply"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ToolNotFound { ref name } if name == "multiply"));
}

#[tokio::test]
async fn test_iteration_limit_production() {
    let client = Arc::new(MockLlmClient::looping(tool_calls(&[divide_call(
        "call_1", 4.0, 2.0,
    )])));
    let config = production().with_max_iterations(3);

    let result = executor(Arc::clone(&client), config)
        .run(&AgentContext::from_user("loop"))
        .await
        .unwrap();

    assert_eq!(client.calls(), 3);
    assert_eq!(result.iterations, 3);
    assert!(result.final_content.is_none());
    assert!(matches!(
        result.error,
        Some(Error::IterationLimitExceeded { max_iterations: 3 })
    ));
    assert!(!result.is_complete());
    // every assistant request is answered
    assert_eq!(result.tool_results().len(), 3);
    assert_eq!(result.messages.len(), 1 + 3 * 2);
}

#[tokio::test]
async fn test_iteration_limit_debug() {
    let client = Arc::new(MockLlmClient::looping(tool_calls(&[divide_call(
        "call_1", 4.0, 2.0,
    )])));
    let config = debug().with_max_iterations(2);

    let err = executor(Arc::clone(&client), config)
        .run(&AgentContext::from_user("loop"))
        .await
        .unwrap_err();

    assert!(err.is_iteration_limit());
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn test_single_iteration_limit() {
    let client = Arc::new(MockLlmClient::replies(vec![tool_calls(&[divide_call(
        "call_1", 4.0, 2.0,
    )])]));
    let result = executor(Arc::clone(&client), production().with_max_iterations(1))
        .run(&AgentContext::from_user("once"))
        .await
        .unwrap();

    assert_eq!(client.calls(), 1);
    assert!(result.error.as_ref().is_some_and(Error::is_iteration_limit));
}

#[tokio::test]
async fn test_results_keep_request_order() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[
            sleep_call("slow", 60),
            sleep_call("fast", 5),
            sleep_call("medium", 30),
        ]),
        text("done"),
    ]));

    let result = executor(client, production())
        .run(&AgentContext::from_user("go"))
        .await
        .unwrap();

    let replies: Vec<(&str, &str)> = result
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| {
            (
                m.tool_call_id.as_deref().unwrap_or_default(),
                m.content.as_str(),
            )
        })
        .collect();
    assert_eq!(
        replies,
        vec![("slow", "slow"), ("fast", "fast"), ("medium", "medium")]
    );
}

#[tokio::test]
async fn test_dispatch_respects_concurrency_limit() {
    let gauge = Arc::new(Gauge::default());
    let calls: Vec<_> = ["a", "b", "c", "d", "e", "f"]
        .into_iter()
        .map(|id| sleep_call(id, 20))
        .collect();
    let client = Arc::new(MockLlmClient::replies(vec![tool_calls(&calls), text("done")]));

    let executor = LlmExecutor::new(client, Arc::new(test_tools(Arc::clone(&gauge))))
        .with_config(production().with_tool_concurrency_limit(2));
    let result = executor.run(&AgentContext::from_user("go")).await.unwrap();

    assert_eq!(result.tool_results().len(), 6);
    assert!(gauge.peak() <= 2, "peak concurrency {}", gauge.peak());
    assert!(gauge.peak() >= 1);
}

#[tokio::test]
async fn test_dispatch_runs_calls_concurrently() {
    let gauge = Arc::new(Gauge::default());
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[sleep_call("a", 50), sleep_call("b", 50), sleep_call("c", 50)]),
        text("done"),
    ]));

    let executor = LlmExecutor::new(client, Arc::new(test_tools(Arc::clone(&gauge))))
        .with_config(production());
    executor.run(&AgentContext::from_user("go")).await.unwrap();

    assert_eq!(gauge.peak(), 3);
}

#[tokio::test]
async fn test_llm_failure_always_raised() {
    let journal = Journal::default();
    let client = Arc::new(MockLlmClient::new(vec![Scripted::Fail("503 Service Unavailable")]));

    let err = executor(client, production())
        .with_hook(RecordingHooks::new("rec", &journal))
        .run(&AgentContext::from_user("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::LlmTransport { ref message } if message.contains("503")));
    assert_eq!(journal.count("rec:on_error:llm_call"), 1);
    assert_eq!(journal.count("rec:after_llm"), 0);
}

#[tokio::test]
async fn test_llm_timeout() {
    let client = Arc::new(MockLlmClient::new(vec![Scripted::Slow(
        Duration::from_millis(500),
        text("too late"),
    )]));
    let config = production().with_llm_timeout(Duration::from_millis(20));

    let err = executor(client, config)
        .run(&AgentContext::from_user("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::LlmTimeout(d) if d == Duration::from_millis(20)));
}

#[tokio::test]
async fn test_tool_timeout_is_a_tool_failure() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[sleep_call("slow", 500), sleep_call("quick", 1)]),
        text("partial"),
    ]));
    let config = production().with_tool_timeout(Duration::from_millis(50));

    let result = executor(client, config)
        .run(&AgentContext::from_user("go"))
        .await
        .unwrap();

    let outcomes = result.tool_results();
    assert_eq!(outcomes[0].error_kind(), Some(ToolErrorKind::Timeout));
    assert!(outcomes[1].is_success());
}

#[tokio::test]
async fn test_blocking_tool_respects_tool_timeout() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[
            block_call("a", 300),
            block_call("b", 300),
            block_call("c", 300),
        ]),
        text("gave up"),
    ]));
    let config = production().with_tool_timeout(Duration::from_millis(20));

    let start = Instant::now();
    let result = executor(client, config)
        .run(&AgentContext::from_user("go"))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    let kinds: Vec<_> = result
        .tool_results()
        .iter()
        .map(|r| r.error_kind())
        .collect();
    assert_eq!(kinds, vec![Some(ToolErrorKind::Timeout); 3]);
    assert!(elapsed < Duration::from_millis(250), "run took {elapsed:?}");
}

#[tokio::test]
async fn test_blocking_tools_run_concurrently() {
    let gauge = Arc::new(Gauge::default());
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[block_call("a", 80), block_call("b", 80), block_call("c", 80)]),
        text("done"),
    ]));

    let executor = LlmExecutor::new(client, Arc::new(test_tools(Arc::clone(&gauge))))
        .with_config(production());
    let result = executor.run(&AgentContext::from_user("go")).await.unwrap();

    assert!(result.tool_results().iter().all(|r| r.is_success()));
    assert_eq!(gauge.peak(), 3);
}

#[tokio::test]
async fn test_unswallowed_failure_cancels_calls_in_flight() {
    let journal = Journal::default();
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[sleep_call("slow", 300), divide_call("bad", 1.0, 0.0)]),
        text("unreachable"),
    ]));

    let err = executor(Arc::clone(&client), debug())
        .with_hook(RecordingHooks::new("rec", &journal))
        .run(&AgentContext::from_user("go"))
        .await
        .unwrap_err();

    assert!(err.is_tool_error());
    assert_eq!(err.tool_error().map(|e| e.to_string()).as_deref(), Some("division by zero"));
    assert_eq!(journal.count("rec:before_tool:sleep:slow"), 1);
    assert_eq!(journal.count("rec:after_tool:slow"), 0);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_hooks_observe_lifecycle_in_order() {
    let journal = Journal::default();
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 10.0, 2.0)]),
        text("5"),
    ]));

    executor(client, production())
        .with_hook(RecordingHooks::new("rec", &journal))
        .run(&AgentContext::from_user("divide"))
        .await
        .unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "rec:before_llm:1",
            "rec:after_llm:15",
            "rec:before_tool:divide:call_1",
            "rec:after_tool:call_1:ok",
            "rec:before_llm:3",
            "rec:after_llm:30",
        ]
    );
}

#[tokio::test]
async fn test_swallowed_tool_failure_reported_to_on_error() {
    let journal = Journal::default();
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 1.0, 0.0)]),
        text("no"),
    ]));

    executor(client, production())
        .with_hook(RecordingHooks::new("rec", &journal))
        .run(&AgentContext::from_user("divide"))
        .await
        .unwrap();

    assert_eq!(journal.count("rec:on_error:tool_call"), 1);
    assert_eq!(journal.count("rec:after_tool:call_1:err"), 1);
}

#[tokio::test]
async fn test_hook_failure_isolated_in_production() {
    let journal = Journal::default();
    let failing = FailingHooks::new(HookPhase::AfterToolCall);
    let failures = Arc::clone(&failing.calls);
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 10.0, 2.0)]),
        text("5"),
    ]));

    let result = executor(client, production())
        .with_hook(failing)
        .with_hook(RecordingHooks::new("rec", &journal))
        .run(&AgentContext::from_user("divide"))
        .await
        .unwrap();

    assert_eq!(result.final_content.as_deref(), Some("5"));
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(journal.count("rec:on_error:after_tool_call"), 1);
    // the remaining observer still receives the callback
    assert_eq!(journal.count("rec:after_tool:call_1:ok"), 1);
}

#[tokio::test]
async fn test_hook_failure_aborts_in_debug() {
    let journal = Journal::default();
    let client = Arc::new(MockLlmClient::replies(vec![text("hi")]));

    let err = executor(Arc::clone(&client), debug())
        .with_hook(RecordingHooks::new("rec", &journal))
        .with_hook(FailingHooks::new(HookPhase::BeforeLlmCall))
        .run(&AgentContext::from_user("hi"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::HookFailed { ref hook, phase: HookPhase::BeforeLlmCall, .. } if hook == "failing"
    ));
    assert_eq!(client.calls(), 0);
    assert_eq!(journal.count("rec:on_error:before_llm_call"), 1);
}

#[tokio::test]
async fn test_hook_failure_continue_policy_in_debug() {
    let client = Arc::new(MockLlmClient::replies(vec![text("hi")]));
    let config = debug().with_hook_failure_policy(HookFailurePolicy::Continue);

    let result = executor(client, config)
        .with_hook(FailingHooks::new(HookPhase::BeforeLlmCall))
        .run(&AgentContext::from_user("hi"))
        .await
        .unwrap();

    assert_eq!(result.final_content.as_deref(), Some("hi"));
}

#[tokio::test]
async fn test_cancellation_discards_in_flight_tools() {
    let journal = Journal::default();
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[sleep_call("slow", 5_000)]),
        text("unreachable"),
    ]));
    let executor = executor(Arc::clone(&client), production())
        .with_hook(RecordingHooks::new("rec", &journal));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = executor
        .run_with_cancellation(&AgentContext::from_user("go"), token)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(client.calls(), 1);
    assert_eq!(journal.count("rec:before_tool"), 1);
    assert_eq!(journal.count("rec:after_tool"), 0);
    assert_eq!(journal.count("rec:on_error:run"), 1);
}

#[tokio::test]
async fn test_missing_call_ids_are_generated() {
    let client = Arc::new(MockLlmClient::replies(vec![
        LlmResponse::new(
            AgentMessage::assistant_with_tools(
                "",
                vec![
                    ToolCall::new("", "divide", json!({"a": 1, "b": 1})),
                    ToolCall::new("", "divide", json!({"a": 2, "b": 1})),
                ],
            ),
            Default::default(),
        ),
        text("ok"),
    ]));

    let result = executor(client, production())
        .run(&AgentContext::from_user("go"))
        .await
        .unwrap();

    let assistant = &result.messages[1];
    let ids: Vec<&str> = assistant.tool_calls.iter().map(|c| c.id.as_str()).collect();
    assert!(ids.iter().all(|id| id.starts_with("call_")));
    assert_ne!(ids[0], ids[1]);
    assert_eq!(result.messages[2].tool_call_id.as_deref(), Some(ids[0]));
    assert_eq!(result.messages[3].tool_call_id.as_deref(), Some(ids[1]));
}

#[tokio::test]
async fn test_usage_is_aggregated() {
    let client = Arc::new(MockLlmClient::replies(vec![
        tool_calls(&[divide_call("call_1", 10.0, 2.0)]),
        text("5"),
    ]));

    let result = executor(client, production())
        .run(&AgentContext::from_user("divide"))
        .await
        .unwrap();

    assert_eq!(result.usage.prompt_tokens, 22);
    assert_eq!(result.usage.completion_tokens, 8);
    assert_eq!(result.usage.llm_calls, 2);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let client = Arc::new(MockLlmClient::replies(vec![text("hi")]));
    let err = executor(Arc::clone(&client), production().with_max_iterations(0))
        .run(&AgentContext::from_user("hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_executor_override_beats_tool_override() {
    let tools = CallableToolExecutor::builder()
        .sync_tool(ToolSchema::new("fail", "Always fails"), |_: serde_json::Value| {
            Err::<(), _>(crate::ToolError::execution_failed("nope"))
        })
        .swallow_exceptions(true)
        .build();
    let script = || {
        Arc::new(MockLlmClient::replies(vec![
            tool_calls(&[("call_1", "fail", json!({}))]),
            text("recovered"),
        ]))
    };

    let tools: Arc<dyn crate::tools::ToolExecutor> = Arc::new(tools);

    let inherited = LlmExecutor::new(script(), Arc::clone(&tools));
    let result = inherited.run(&AgentContext::from_user("go")).await.unwrap();
    assert_eq!(result.final_content.as_deref(), Some("recovered"));

    let strict = LlmExecutor::new(script(), tools)
        .with_config(LlmExecutorConfig::new().with_swallow_tool_exceptions(false));
    let err = strict.run(&AgentContext::from_user("go")).await.unwrap_err();
    assert!(err.is_tool_error());
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let client = Arc::new(MockLlmClient::looping(text("same")));
    let executor = executor(client, production());

    let first_ctx = AgentContext::from_user("one");
    let second_ctx = AgentContext::from_user("two");
    let (first, second) = tokio::join!(executor.run(&first_ctx), executor.run(&second_ctx));

    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.messages[0].content, "one");
    assert_eq!(second.messages[0].content, "two");
}
