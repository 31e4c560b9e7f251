//! Dispatched script descriptors

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Describes a script and the nodes it should be dispatched to
///
/// The core never inspects a descriptor; only the dispatch engine does.
pub trait DispatchedScript: Debug + Send + Sync {
    /// Project the script runs under, if set
    fn project(&self) -> Option<&str>;

    /// Inline script content
    fn script(&self) -> Option<&str>;

    /// Path to a script file on the server
    fn server_script_path(&self) -> Option<&Path>;

    /// Arguments passed to the script
    fn args(&self) -> &[String];

    /// Filter selecting target nodes; `None` means the local node
    fn node_filter(&self) -> Option<&str>;
}

/// Plain data implementation of [`DispatchedScript`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub server_script_path: Option<PathBuf>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub node_filter: Option<String>,
}

impl ScriptDescriptor {
    /// A descriptor running inline content
    pub fn inline(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            ..Default::default()
        }
    }

    /// A descriptor running a script file
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            server_script_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn add_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_node_filter(mut self, filter: impl Into<String>) -> Self {
        self.node_filter = Some(filter.into());
        self
    }
}

impl DispatchedScript for ScriptDescriptor {
    fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    fn server_script_path(&self) -> Option<&Path> {
        self.server_script_path.as_deref()
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    fn node_filter(&self) -> Option<&str> {
        self.node_filter.as_deref()
    }
}
