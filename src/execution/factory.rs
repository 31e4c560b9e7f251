//! Execution Service Factory
//!
//! Single point of construction for execution services. The factory owns the
//! executor registry; every service it builds gets a copy of the bindings as
//! they stood at that moment.
//!
//! Registration is configuration work: register executors during startup,
//! then build services. The lock only keeps individual calls consistent, it
//! does not order registration against construction.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::executor_trait::{ExecutionContext, Executor, ExecutorClass};
use super::listener::ExecutionListener;
use super::registry::{ExecutorRegistry, RegistrySnapshot};
use super::script::DispatchedScript;
use super::service::ExecutionService;
use super::types::{DispatchedScriptExecutionItem, ExecutionItem, ExecutionItemKind};

lazy_static::lazy_static! {
    static ref INSTANCE: ExecutionServiceFactory = ExecutionServiceFactory::new();
}

/// Creates execution services from the current registry bindings
#[derive(Debug)]
pub struct ExecutionServiceFactory {
    registry: RwLock<ExecutorRegistry>,
}

impl ExecutionServiceFactory {
    /// Factory with a freshly seeded registry
    pub fn new() -> Self {
        Self::with_registry(ExecutorRegistry::new())
    }

    pub fn with_registry(registry: ExecutorRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
        }
    }

    /// The process-wide factory
    pub fn instance() -> &'static ExecutionServiceFactory {
        &INSTANCE
    }

    // Registry writes are single map updates; a poisoned lock still guards a consistent map.
    fn read_registry(&self) -> RwLockReadGuard<'_, ExecutorRegistry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, ExecutorRegistry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Reset class-level bindings to the built-in defaults
    pub fn reset_default_executor_classes(&self) {
        self.write_registry().reset_default_executor_classes();
    }

    /// Set the default executor class for an item kind
    pub fn set_default_executor_class(&self, kind: ExecutionItemKind, class: ExecutorClass) {
        self.write_registry().set_default_executor_class(kind, class);
    }

    /// Set a shared executor instance for an item kind
    pub fn set_default_executor(&self, kind: ExecutionItemKind, executor: Arc<dyn Executor>) {
        self.write_registry().set_default_executor(kind, executor);
    }

    /// Copy of the bindings a service built now would get
    pub fn registry_snapshot(&self) -> RegistrySnapshot {
        self.read_registry().snapshot()
    }

    /// Create an execution service with no listener
    pub fn create_execution_service(&self, context: Arc<ExecutionContext>) -> ExecutionService {
        let service = ExecutionService::new(self.registry_snapshot(), context, None);
        debug!("Created execution service {}", service.id());
        service
    }

    /// Create an execution service reporting to `listener`
    pub fn create_execution_service_with_listener(
        &self,
        context: Arc<ExecutionContext>,
        listener: Arc<dyn ExecutionListener>,
    ) -> ExecutionService {
        let service = ExecutionService::new(self.registry_snapshot(), context, Some(listener));
        debug!("Created execution service {} with listener", service.id());
        service
    }

    /// Wrap a dispatched script as an execution item
    ///
    /// The descriptor is not validated here; the dispatch engine rejects
    /// descriptors it cannot run.
    pub fn create_dispatched_script_execution_item(
        script: Arc<dyn DispatchedScript>,
    ) -> ExecutionItem {
        ExecutionItem::DispatchedScript(DispatchedScriptExecutionItem::new(script))
    }
}

impl Default for ExecutionServiceFactory {
    fn default() -> Self {
        Self::new()
    }
}
