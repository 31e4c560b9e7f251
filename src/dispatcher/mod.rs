//! Script dispatch engines usable as an `ExecutionContext` dispatcher

pub mod local;

pub use local::LocalScriptDispatcher;
