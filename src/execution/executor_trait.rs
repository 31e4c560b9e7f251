//! Executor Interface
//!
//! Defines the `Executor` trait every executor implements, the runtime
//! context handed to it, and the named constructors used as class-level
//! registry bindings.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ExecutionError;

use super::script::DispatchedScript;
use super::types::{ExecutionItem, ExecutionItemKind, ExecutionResult};

/// What the dispatch engine reports after running a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub exit_code: i32,
    pub output: String,
}

/// The engine that actually runs a dispatched script on its target nodes
#[async_trait]
pub trait ScriptDispatcher: Send + Sync {
    /// Run the script and wait for it to finish
    async fn dispatch(&self, script: &dyn DispatchedScript) -> Result<DispatchOutcome>;
}

/// Runtime context passed to every executor
pub struct ExecutionContext {
    /// Directory scripts run from
    pub project_path: PathBuf,
    /// Application configuration
    pub config: Arc<Config>,
    /// Engine used to run dispatched scripts
    pub dispatcher: Arc<dyn ScriptDispatcher>,
}

impl ExecutionContext {
    pub fn new(
        project_path: PathBuf,
        config: Arc<Config>,
        dispatcher: Arc<dyn ScriptDispatcher>,
    ) -> Self {
        Self {
            project_path,
            config,
            dispatcher,
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("project_path", &self.project_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Something that can run one kind of execution item
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executor name, also used as the class name of its default binding
    fn name(&self) -> &str;

    /// Run the item
    ///
    /// Returns `Ok` with an unsuccessful result when the item ran and failed,
    /// and `Err` when it could not be run at all.
    async fn execute(&self, item: &ExecutionItem, ctx: &ExecutionContext)
        -> Result<ExecutionResult>;
}

type ConstructorFn = dyn Fn(&ExecutionContext) -> Result<Arc<dyn Executor>> + Send + Sync;

/// A named executor constructor, registered as a class-level binding
///
/// Nothing is checked at registration; a constructor that fails is only
/// noticed when a service resolves its kind.
#[derive(Clone)]
pub struct ExecutorClass {
    name: String,
    constructor: Arc<ConstructorFn>,
}

impl ExecutorClass {
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Result<Arc<dyn Executor>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(constructor),
        }
    }

    /// Class for an executor built with `Default`
    pub fn of<E>(name: impl Into<String>) -> Self
    where
        E: Executor + Default + 'static,
    {
        Self::new(name, |_ctx| Ok(Arc::new(E::default()) as Arc<dyn Executor>))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a fresh executor for `kind`
    pub fn instantiate(
        &self,
        kind: &ExecutionItemKind,
        ctx: &ExecutionContext,
    ) -> std::result::Result<Arc<dyn Executor>, ExecutionError> {
        (self.constructor)(ctx).map_err(|e| ExecutionError::ExecutorConstruction {
            kind: kind.clone(),
            executor: self.name.clone(),
            source: e.into(),
        })
    }
}

impl fmt::Debug for ExecutorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorClass")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Helper struct for building execution results
pub struct ExecutionResultBuilder {
    success: bool,
    output: String,
    error: Option<String>,
    exit_code: Option<i32>,
    duration_ms: u64,
}

impl ExecutionResultBuilder {
    pub fn success() -> Self {
        Self {
            success: true,
            output: String::new(),
            error: None,
            exit_code: None,
            duration_ms: 0,
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            ..Self::success()
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the error message; marks the result as failed
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.success = false;
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn build(self) -> ExecutionResult {
        ExecutionResult {
            success: self.success,
            output: self.output,
            error: self.error,
            exit_code: self.exit_code,
            duration_ms: self.duration_ms,
        }
    }
}

/// Utility for measuring execution time
pub struct ExecutionTimer {
    start: std::time::Instant,
}

impl ExecutionTimer {
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
