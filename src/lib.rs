// Library exports for exec-dispatch
// This allows the modules to be imported in tests and external code

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod execution;

pub use error::{ExecutionError, Result};
