//! Execution Item Types
//!
//! The taxonomy of work an execution service can run, and the result an
//! executor reports back.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::script::DispatchedScript;

/// Category of work, used as the registry key
///
/// `DispatchedScript` is built in. `Custom` kinds exist only once something
/// registers an executor for them. A custom name equal to a built-in name
/// denotes the built-in kind; use `custom` or `canonical` to build keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionItemKind {
    /// A script sent to one or more nodes
    DispatchedScript,
    /// A user-defined kind, identified by name
    Custom(String),
}

const DISPATCHED_SCRIPT: &str = "dispatched-script";

impl ExecutionItemKind {
    /// Kind for a name; built-in names map to the built-in kind
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            DISPATCHED_SCRIPT => ExecutionItemKind::DispatchedScript,
            _ => ExecutionItemKind::Custom(name),
        }
    }

    /// Same kind with any built-in name spelled as `Custom` folded back
    pub fn canonical(&self) -> Self {
        match self {
            ExecutionItemKind::Custom(name) => Self::custom(name.as_str()),
            builtin => builtin.clone(),
        }
    }

    /// Whether this is one of the kinds known at compile time
    pub fn is_builtin(&self) -> bool {
        matches!(self, ExecutionItemKind::DispatchedScript)
    }
}

impl fmt::Display for ExecutionItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionItemKind::DispatchedScript => write!(f, "{}", DISPATCHED_SCRIPT),
            ExecutionItemKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for ExecutionItemKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::custom(s))
    }
}

/// A dispatched script wrapped as an execution item
///
/// Immutable after construction. The descriptor is shared, never copied.
#[derive(Debug, Clone)]
pub struct DispatchedScriptExecutionItem {
    script: Arc<dyn DispatchedScript>,
}

impl DispatchedScriptExecutionItem {
    pub fn new(script: Arc<dyn DispatchedScript>) -> Self {
        Self { script }
    }

    /// The descriptor exactly as supplied
    pub fn dispatched_script(&self) -> &Arc<dyn DispatchedScript> {
        &self.script
    }
}

/// An item of a user-defined kind
#[derive(Debug, Clone, PartialEq)]
pub struct CustomExecutionItem {
    pub kind: String,
    pub payload: serde_json::Value,
}

impl CustomExecutionItem {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// A unit of requested work
#[derive(Debug, Clone)]
pub enum ExecutionItem {
    DispatchedScript(DispatchedScriptExecutionItem),
    Custom(CustomExecutionItem),
}

impl ExecutionItem {
    /// The kind used to look up this item's executor
    pub fn kind(&self) -> ExecutionItemKind {
        match self {
            ExecutionItem::DispatchedScript(_) => ExecutionItemKind::DispatchedScript,
            ExecutionItem::Custom(item) => ExecutionItemKind::custom(item.kind.as_str()),
        }
    }

    pub fn as_dispatched_script(&self) -> Option<&DispatchedScriptExecutionItem> {
        match self {
            ExecutionItem::DispatchedScript(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomExecutionItem> {
        match self {
            ExecutionItem::Custom(item) => Some(item),
            _ => None,
        }
    }
}

impl From<DispatchedScriptExecutionItem> for ExecutionItem {
    fn from(item: DispatchedScriptExecutionItem) -> Self {
        ExecutionItem::DispatchedScript(item)
    }
}

impl From<CustomExecutionItem> for ExecutionItem {
    fn from(item: CustomExecutionItem) -> Self {
        ExecutionItem::Custom(item)
    }
}

/// Result of running an execution item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the item succeeded
    pub success: bool,
    /// Output captured while running
    pub output: String,
    /// Error message if failed
    pub error: Option<String>,
    /// Exit code, when the item ran as a process
    pub exit_code: Option<i32>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}
