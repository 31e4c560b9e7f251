//! Executor Registry
//!
//! Maps execution item kinds to the executor that runs them. Each kind carries
//! a two-tier binding: a class (constructor, instantiated on every
//! resolution) and an instance (shared, reused as is). The instance always
//! wins when both are present.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ExecutionError, Result};

use super::executor_trait::{ExecutionContext, Executor, ExecutorClass};
use super::executors::DispatchedScriptExecutor;
use super::types::ExecutionItemKind;

/// Binding for one execution item kind
#[derive(Clone, Default)]
pub struct ExecutorBinding {
    /// Class-level default, instantiated on each resolution
    pub class: Option<ExecutorClass>,
    /// Instance-level override, shared across resolutions
    pub instance: Option<Arc<dyn Executor>>,
}

impl ExecutorBinding {
    pub fn is_empty(&self) -> bool {
        self.class.is_none() && self.instance.is_none()
    }

    /// Resolve the executor: instance first, then class
    pub fn resolve(
        &self,
        kind: &ExecutionItemKind,
        ctx: &ExecutionContext,
    ) -> Result<Arc<dyn Executor>> {
        if let Some(instance) = &self.instance {
            return Ok(instance.clone());
        }

        match &self.class {
            Some(class) => class.instantiate(kind, ctx),
            None => Err(ExecutionError::UnregisteredKind(kind.clone())),
        }
    }

    /// Name of the executor that would be resolved, for display
    pub fn describe(&self) -> String {
        match (&self.instance, &self.class) {
            (Some(instance), Some(class)) => {
                format!("instance '{}' (shadows class '{}')", instance.name(), class.name())
            }
            (Some(instance), None) => format!("instance '{}'", instance.name()),
            (None, Some(class)) => format!("class '{}'", class.name()),
            (None, None) => "unbound".to_string(),
        }
    }
}

impl std::fmt::Debug for ExecutorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorBinding")
            .field("class", &self.class.as_ref().map(|c| c.name().to_string()))
            .field(
                "instance",
                &self.instance.as_ref().map(|i| i.name().to_string()),
            )
            .finish()
    }
}

/// Registry of executor bindings, keyed by item kind
#[derive(Debug, Clone)]
pub struct ExecutorRegistry {
    bindings: HashMap<ExecutionItemKind, ExecutorBinding>,
}

impl ExecutorRegistry {
    /// Registry seeded with the built-in binding
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.install_builtin_classes();
        registry
    }

    /// Registry with no bindings at all
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    fn install_builtin_classes(&mut self) {
        self.bindings
            .entry(ExecutionItemKind::DispatchedScript)
            .or_default()
            .class = Some(DispatchedScriptExecutor::class());
    }

    /// Drop every class-level binding and reinstate the built-in one
    ///
    /// Instance overrides are kept.
    pub fn reset_default_executor_classes(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.class = None;
        }
        self.bindings.retain(|_, binding| binding.instance.is_some());
        self.install_builtin_classes();
        info!("Executor classes reset to built-in defaults");
    }

    /// Register or replace the class-level binding for a kind
    pub fn set_default_executor_class(&mut self, kind: ExecutionItemKind, class: ExecutorClass) {
        info!("Registered executor class '{}' for {}", class.name(), kind);
        self.bindings.entry(kind.canonical()).or_default().class = Some(class);
    }

    /// Register or replace the instance-level binding for a kind
    pub fn set_default_executor(&mut self, kind: ExecutionItemKind, executor: Arc<dyn Executor>) {
        info!("Registered executor instance '{}' for {}", executor.name(), kind);
        self.bindings.entry(kind.canonical()).or_default().instance = Some(executor);
    }

    pub fn binding(&self, kind: &ExecutionItemKind) -> Option<&ExecutorBinding> {
        self.bindings.get(&kind.canonical())
    }

    /// Check if a kind has any binding
    pub fn has(&self, kind: &ExecutionItemKind) -> bool {
        self.binding(kind).is_some_and(|b| !b.is_empty())
    }

    /// All bound kinds, sorted by name
    pub fn kinds(&self) -> Vec<ExecutionItemKind> {
        sorted_kinds(&self.bindings)
    }

    /// Copy the current bindings
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            bindings: self.bindings.clone(),
        }
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of the registry taken when a service is built
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    bindings: HashMap<ExecutionItemKind, ExecutorBinding>,
}

impl RegistrySnapshot {
    /// Resolve the executor for a kind
    pub fn resolve(
        &self,
        kind: &ExecutionItemKind,
        ctx: &ExecutionContext,
    ) -> Result<Arc<dyn Executor>> {
        let binding = self
            .binding(kind)
            .ok_or_else(|| ExecutionError::UnregisteredKind(kind.clone()))?;

        let executor = binding.resolve(kind, ctx)?;
        debug!("Resolved {} to executor '{}'", kind, executor.name());
        Ok(executor)
    }

    pub fn binding(&self, kind: &ExecutionItemKind) -> Option<&ExecutorBinding> {
        self.bindings.get(&kind.canonical())
    }

    pub fn kinds(&self) -> Vec<ExecutionItemKind> {
        sorted_kinds(&self.bindings)
    }
}

fn sorted_kinds(bindings: &HashMap<ExecutionItemKind, ExecutorBinding>) -> Vec<ExecutionItemKind> {
    let mut kinds: Vec<_> = bindings
        .iter()
        .filter(|(_, binding)| !binding.is_empty())
        .map(|(kind, _)| kind.clone())
        .collect();
    kinds.sort_by_key(|kind| kind.to_string());
    kinds
}
