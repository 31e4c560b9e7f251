use thiserror::Error;

use crate::execution::ExecutionItemKind;

/// Boxed cause carried by construction and execution failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while resolving or running an executor
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No class binding and no instance binding exist for the kind
    #[error("no executor registered for execution item kind '{0}'")]
    UnregisteredKind(ExecutionItemKind),

    /// A class binding's constructor failed
    #[error("failed to construct executor '{executor}' for '{kind}': {source}")]
    ExecutorConstruction {
        kind: ExecutionItemKind,
        executor: String,
        #[source]
        source: BoxError,
    },

    /// The resolved executor does not accept this item variant
    #[error("executor '{executor}' cannot run items of kind '{kind}'")]
    IncompatibleItem {
        executor: String,
        kind: ExecutionItemKind,
    },

    /// The executor ran and returned an error
    #[error("executor '{executor}' failed: {source}")]
    ExecutorFailed {
        executor: String,
        #[source]
        source: BoxError,
    },
}

impl ExecutionError {
    /// Check if this error comes from registry resolution rather than from running the item
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            ExecutionError::UnregisteredKind(_) | ExecutionError::ExecutorConstruction { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
