#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use exec_dispatch::config::Config;
use exec_dispatch::execution::{
    DispatchOutcome, DispatchedScript, ExecutionContext, ExecutionItem, ExecutionResult,
    ExecutionResultBuilder, Executor, ExecutorClass, ScriptDispatcher,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Dispatcher that never touches the system and reports a fixed exit code
pub struct StubDispatcher {
    pub exit_code: i32,
    pub calls: AtomicUsize,
}

impl StubDispatcher {
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ScriptDispatcher for StubDispatcher {
    async fn dispatch(&self, script: &dyn DispatchedScript) -> Result<DispatchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DispatchOutcome {
            exit_code: self.exit_code,
            output: script.script().unwrap_or_default().to_string(),
        })
    }
}

/// Executor identified only by its name
pub struct NamedExecutor {
    name: String,
}

impl NamedExecutor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Executor for NamedExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _item: &ExecutionItem, _ctx: &ExecutionContext) -> Result<ExecutionResult> {
        Ok(ExecutionResultBuilder::success()
            .with_output(format!("handled by {}", self.name))
            .build())
    }
}

/// Executor that always returns an error
pub struct FailingExecutor;

#[async_trait]
impl Executor for FailingExecutor {
    fn name(&self) -> &str {
        "failing"
    }

    async fn execute(&self, _item: &ExecutionItem, _ctx: &ExecutionContext) -> Result<ExecutionResult> {
        anyhow::bail!("connection refused")
    }
}

/// Class producing `NamedExecutor`s, counting how often it was instantiated
pub fn counting_class(name: &'static str, counter: Arc<AtomicUsize>) -> ExecutorClass {
    ExecutorClass::new(name, move |_ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(NamedExecutor::new(name)) as Arc<dyn Executor>)
    })
}

pub fn named_class(name: &'static str) -> ExecutorClass {
    counting_class(name, Arc::new(AtomicUsize::new(0)))
}

pub fn test_context() -> Arc<ExecutionContext> {
    context_with(Arc::new(StubDispatcher::new(0)))
}

pub fn context_with(dispatcher: Arc<StubDispatcher>) -> Arc<ExecutionContext> {
    Arc::new(ExecutionContext::new(
        PathBuf::from("/tmp"),
        Arc::new(Config::default()),
        dispatcher,
    ))
}
