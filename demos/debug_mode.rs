//! Debug Mode vs Production Mode
//!
//! Shows how a failing tool is handled under each mode:
//! - Production: the failure becomes an error result the LLM can read
//! - Debug: the failure is raised to the caller with its source chain
//!
//! Run: cargo run --example debug_mode
//! Or start in debug mode: AGENT_RUNTIME_DEBUG=1 cargo run --example debug_mode

use agent_runtime::config::{self, ConfigUpdate};
use agent_runtime::{CallableToolExecutor, ToolError, ToolExecutor, ToolParameter, ToolSchema};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct Divide {
    a: f64,
    b: f64,
}

fn calculator() -> CallableToolExecutor {
    CallableToolExecutor::builder()
        .sync_tool(
            ToolSchema::new("divide", "Divide two numbers")
                .parameter(ToolParameter::required("a", "number", "Dividend"))
                .parameter(ToolParameter::required("b", "number", "Divisor")),
            |args: Divide| {
                if args.b == 0.0 {
                    return Err(ToolError::execution_failed("division by zero"));
                }
                Ok(format!("Result: {:?}", args.a / args.b))
            },
        )
        .build()
}

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

async fn successful_call(tools: &CallableToolExecutor) -> agent_runtime::Result<()> {
    banner("SUCCESSFUL CALL - Works in both modes");
    let result = tools.invoke("divide", json!({"a": 10, "b": 2})).await?;
    println!("\nResult: {}", result.content());
    Ok(())
}

async fn production_mode(tools: &CallableToolExecutor) -> agent_runtime::Result<()> {
    banner("PRODUCTION MODE - Failures become error results");
    config::configure(ConfigUpdate::new().debug(false));

    let result = tools.invoke("divide", json!({"a": 10, "b": 0})).await?;
    println!("\nResult: {}", result.content());
    println!("  kind: {:?}", result.error_kind());
    println!("The agent keeps running and the LLM sees the error");
    Ok(())
}

async fn debug_mode(tools: &CallableToolExecutor) {
    banner("DEBUG MODE - Failures are raised");
    config::configure(ConfigUpdate::new().debug(true));

    match tools.invoke("divide", json!({"a": 10, "b": 0})).await {
        Ok(result) => println!("\nResult: {}", result.content()),
        Err(e) => {
            println!("\nError raised: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                println!("  caused by: {}", cause);
                source = cause.source();
            }
        }
    }
}

#[tokio::main]
async fn main() -> agent_runtime::Result<()> {
    println!("\nAgent Runtime - Debug Mode Demo");
    println!("Starting config: {:?}", config::get_config());

    let tools = calculator();
    successful_call(&tools).await?;
    production_mode(&tools).await?;
    debug_mode(&tools).await;

    banner("Summary");
    println!("- Production mode: failures -> error results");
    println!("- Debug mode: failures -> raised errors");
    println!("\nSet in code: config::configure(ConfigUpdate::new().debug(true))");
    println!("Set via env: AGENT_RUNTIME_DEBUG=1");
    Ok(())
}
