//! Execution Listeners
//!
//! Lifecycle notifications emitted by an execution service while it runs
//! items.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::ExecutionError;

use super::types::{ExecutionItem, ExecutionItemKind, ExecutionResult};

/// Severity of a listener log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Verbose => write!(f, "VERBOSE"),
            LogLevel::Debug => write!(f, "DEBUG"),
        }
    }
}

/// Receives lifecycle notifications from an execution service
///
/// Every method has a no-op default so listeners only implement what they
/// care about.
pub trait ExecutionListener: Send + Sync {
    /// An executor was resolved and is about to run the item
    fn begin_execution(&self, _item: &ExecutionItem) {}

    /// The executor returned a result, successful or not
    fn finish_execution(&self, _item: &ExecutionItem, _result: &ExecutionResult) {}

    /// Resolution or execution raised an error
    fn execution_failed(&self, _item: &ExecutionItem, _error: &ExecutionError) {}

    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Forwards notifications to `tracing`
#[derive(Debug, Default)]
pub struct TracingListener;

impl ExecutionListener for TracingListener {
    fn begin_execution(&self, item: &ExecutionItem) {
        tracing::info!("Starting {} item", item.kind());
    }

    fn finish_execution(&self, item: &ExecutionItem, result: &ExecutionResult) {
        if result.success {
            tracing::info!("{} item completed in {}ms", item.kind(), result.duration_ms);
        } else {
            tracing::warn!(
                "{} item failed in {}ms: {}",
                item.kind(),
                result.duration_ms,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    fn execution_failed(&self, item: &ExecutionItem, error: &ExecutionError) {
        tracing::error!("{} item could not run: {}", item.kind(), error);
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Verbose | LogLevel::Debug => tracing::debug!("{}", message),
        }
    }
}

/// Notification sent by a [`ChannelListener`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    Started {
        kind: ExecutionItemKind,
    },
    Finished {
        kind: ExecutionItemKind,
        success: bool,
        duration_ms: u64,
    },
    Failed {
        kind: ExecutionItemKind,
        error: String,
    },
    Log {
        level: LogLevel,
        message: String,
    },
}

/// Emits notifications as [`ExecutionEvent`]s on a channel
pub struct ChannelListener {
    event_tx: UnboundedSender<ExecutionEvent>,
}

impl ChannelListener {
    pub fn new(event_tx: UnboundedSender<ExecutionEvent>) -> Self {
        Self { event_tx }
    }

    fn emit(&self, event: ExecutionEvent) {
        // Receiver may be gone; notifications are best effort
        let _ = self.event_tx.send(event);
    }
}

impl ExecutionListener for ChannelListener {
    fn begin_execution(&self, item: &ExecutionItem) {
        self.emit(ExecutionEvent::Started { kind: item.kind() });
    }

    fn finish_execution(&self, item: &ExecutionItem, result: &ExecutionResult) {
        self.emit(ExecutionEvent::Finished {
            kind: item.kind(),
            success: result.success,
            duration_ms: result.duration_ms,
        });
    }

    fn execution_failed(&self, item: &ExecutionItem, error: &ExecutionError) {
        self.emit(ExecutionEvent::Failed {
            kind: item.kind(),
            error: error.to_string(),
        });
    }

    fn log(&self, level: LogLevel, message: &str) {
        self.emit(ExecutionEvent::Log {
            level,
            message: message.to_string(),
        });
    }
}
