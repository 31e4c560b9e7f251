//! Executor Implementations
//!
//! Built-in implementations of the `Executor` trait, one per built-in
//! execution item kind.

pub mod dispatched_script;

pub use dispatched_script::DispatchedScriptExecutor;
