use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for dispatching scripts to nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Project used when a descriptor does not name one (default: "default")
    #[serde(default = "default_project")]
    pub project: String,

    /// Name of the node the local dispatcher answers for (default: "localhost")
    #[serde(default = "default_local_node")]
    pub local_node: String,

    /// Shell used to run scripts (default: "sh")
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Timeout for a dispatched script in seconds (default: 120)
    #[serde(default = "default_script_timeout")]
    pub script_timeout_secs: u64,

    /// Maximum output size in bytes before truncation (default: 1MB)
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_project() -> String {
    "default".to_string()
}

fn default_local_node() -> String {
    "localhost".to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_script_timeout() -> u64 {
    120
}

fn default_max_output_bytes() -> usize {
    1_048_576 // 1MB
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            local_node: default_local_node(),
            shell: default_shell(),
            script_timeout_secs: default_script_timeout(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "exec_dispatch=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, falling back to defaults when the file is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Write the default configuration unless a file already exists
    ///
    /// Returns whether a file was written.
    pub fn init_at(config_path: &Path) -> Result<bool> {
        if config_path.exists() {
            return Ok(false);
        }

        Self::default().save_to(config_path)?;
        Ok(true)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;
        Ok(config_dir.join("exec-dispatch").join("config.toml"))
    }
}
