//! Execution Service
//!
//! Runs execution items against the registry snapshot taken when the service
//! was built:
//! 1. Resolve the executor for the item's kind
//! 2. Notify the listener that execution begins
//! 3. Run the executor
//! 4. Notify the listener of the result or the error

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ExecutionError, Result};

use super::executor_trait::{ExecutionContext, Executor};
use super::listener::{ExecutionListener, LogLevel};
use super::registry::RegistrySnapshot;
use super::types::{ExecutionItem, ExecutionItemKind, ExecutionResult};

/// Dispatches execution items to their executors
///
/// Built by `ExecutionServiceFactory`. The listener, if any, is fixed at
/// construction.
pub struct ExecutionService {
    id: Uuid,
    bindings: RegistrySnapshot,
    context: Arc<ExecutionContext>,
    listener: Option<Arc<dyn ExecutionListener>>,
}

impl ExecutionService {
    pub(crate) fn new(
        bindings: RegistrySnapshot,
        context: Arc<ExecutionContext>,
        listener: Option<Arc<dyn ExecutionListener>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bindings,
            context,
            listener,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    pub fn listener(&self) -> Option<&Arc<dyn ExecutionListener>> {
        self.listener.as_ref()
    }

    /// Bindings captured when this service was built
    pub fn bindings(&self) -> &RegistrySnapshot {
        &self.bindings
    }

    /// Resolve the executor for a kind against this service's snapshot
    pub fn resolve_executor(&self, kind: &ExecutionItemKind) -> Result<Arc<dyn Executor>> {
        self.bindings.resolve(kind, &self.context)
    }

    /// Run a single item
    pub async fn execute_item(&self, item: &ExecutionItem) -> Result<ExecutionResult> {
        let kind = item.kind();

        let executor = match self.resolve_executor(&kind) {
            Ok(executor) => executor,
            Err(e) => {
                self.notify_failed(item, &e);
                return Err(e);
            }
        };

        info!(service = %self.id, "Running {} item with '{}'", kind, executor.name());
        if let Some(listener) = &self.listener {
            listener.log(
                LogLevel::Debug,
                &format!("Using executor '{}' for {}", executor.name(), kind),
            );
            listener.begin_execution(item);
        }

        match executor.execute(item, &self.context).await {
            Ok(result) => {
                debug!(service = %self.id, "{} item finished (success: {})", kind, result.success);
                if let Some(listener) = &self.listener {
                    listener.finish_execution(item, &result);
                }
                Ok(result)
            }
            Err(e) => {
                // Executors may surface our own error type through anyhow
                let error = match e.downcast::<ExecutionError>() {
                    Ok(error) => error,
                    Err(other) => ExecutionError::ExecutorFailed {
                        executor: executor.name().to_string(),
                        source: other.into(),
                    },
                };
                self.notify_failed(item, &error);
                Err(error)
            }
        }
    }

    fn notify_failed(&self, item: &ExecutionItem, error: &ExecutionError) {
        if error.is_resolution_error() {
            warn!(service = %self.id, "No usable executor for {}: {}", item.kind(), error);
        } else {
            warn!(service = %self.id, "{} item failed: {}", item.kind(), error);
        }
        if let Some(listener) = &self.listener {
            listener.execution_failed(item, error);
        }
    }
}

impl fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionService")
            .field("id", &self.id)
            .field("bindings", &self.bindings)
            .field("context", &self.context)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
