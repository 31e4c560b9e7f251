//! Dispatched Script Executor
//!
//! Hands a dispatched script to the context's dispatch engine and turns the
//! engine's outcome into an execution result.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::error::ExecutionError;
use crate::execution::{
    ExecutionContext, ExecutionItem, ExecutionResult, ExecutionResultBuilder, ExecutionTimer,
    Executor, ExecutorClass,
};

/// Default executor for `ExecutionItemKind::DispatchedScript`
#[derive(Debug, Default)]
pub struct DispatchedScriptExecutor;

impl DispatchedScriptExecutor {
    pub const NAME: &'static str = "dispatched-script";

    pub fn new() -> Self {
        Self
    }

    /// Class-level binding installed in every fresh registry
    pub fn class() -> ExecutorClass {
        ExecutorClass::of::<DispatchedScriptExecutor>(Self::NAME)
    }
}

#[async_trait]
impl Executor for DispatchedScriptExecutor {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, item: &ExecutionItem, ctx: &ExecutionContext) -> Result<ExecutionResult> {
        let script_item = item
            .as_dispatched_script()
            .ok_or_else(|| ExecutionError::IncompatibleItem {
                executor: Self::NAME.to_string(),
                kind: item.kind(),
            })?;

        let script = script_item.dispatched_script();
        debug!(
            "Dispatching script (project: {}, nodes: {})",
            script.project().unwrap_or(&ctx.config.dispatch.project),
            script.node_filter().unwrap_or(&ctx.config.dispatch.local_node)
        );

        let timer = ExecutionTimer::start();
        let outcome = ctx.dispatcher.dispatch(script.as_ref()).await?;
        let duration = timer.elapsed_ms();

        let result = if outcome.exit_code == 0 {
            ExecutionResultBuilder::success()
        } else {
            ExecutionResultBuilder::failure()
                .with_error(format!("Script exited with status {}", outcome.exit_code))
        };

        Ok(result
            .with_output(outcome.output)
            .with_exit_code(outcome.exit_code)
            .with_duration(duration)
            .build())
    }
}
