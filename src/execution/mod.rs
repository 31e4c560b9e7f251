//! Execution Dispatch
//!
//! Type-directed selection of the executor that runs a unit of work:
//! - Item kinds are a tagged enum (`ExecutionItemKind`)
//! - The registry binds each kind to an executor class, an executor instance,
//!   or both (instance wins)
//! - The factory builds execution services carrying a snapshot of the registry
//! - Services resolve executors per item and report to an optional listener

pub mod executor_trait;
pub mod executors;
pub mod factory;
pub mod listener;
pub mod registry;
pub mod script;
pub mod service;
pub mod types;

pub use executor_trait::*;
pub use executors::DispatchedScriptExecutor;
pub use factory::ExecutionServiceFactory;
pub use listener::{ChannelListener, ExecutionEvent, ExecutionListener, LogLevel, TracingListener};
pub use registry::{ExecutorBinding, ExecutorRegistry, RegistrySnapshot};
pub use script::{DispatchedScript, ScriptDescriptor};
pub use service::ExecutionService;
pub use types::*;
