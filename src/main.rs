use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exec_dispatch::config::Config;
use exec_dispatch::dispatcher::LocalScriptDispatcher;
use exec_dispatch::execution::{
    ExecutionContext, ExecutionServiceFactory, ScriptDescriptor, TracingListener,
};

#[derive(Parser)]
#[command(name = "exec-dispatch")]
#[command(about = "Dispatch execution items to their registered executors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script on the local node
    Run {
        /// Inline script content
        #[arg(short, long, conflicts_with = "file")]
        script: Option<String>,
        /// Script file to run
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Argument passed to the script (repeatable)
        #[arg(short, long = "arg")]
        args: Vec<String>,
        /// Node filter (comma-separated node names)
        #[arg(short, long)]
        node: Option<String>,
        /// Project name
        #[arg(long)]
        project: Option<String>,
        /// Working directory (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// List registered execution item kinds and their executors
    Kinds,
    /// Configure exec-dispatch
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
        /// Set the script timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Set the shell used for scripts
        #[arg(long)]
        shell: Option<String>,
        /// Set the local node name
        #[arg(long)]
        local_node: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            file,
            args,
            node,
            project,
            path,
        } => {
            let descriptor = build_descriptor(script, file, args, node, project)?;
            let exit_code = run_script(config, path, descriptor).await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Commands::Kinds => {
            list_kinds();
        }
        Commands::Config {
            show,
            init,
            timeout,
            shell,
            local_node,
        } => {
            if init {
                return init_config();
            }
            handle_config(config, show, timeout, shell, local_node)?;
        }
    }

    Ok(())
}

fn build_descriptor(
    script: Option<String>,
    file: Option<PathBuf>,
    args: Vec<String>,
    node: Option<String>,
    project: Option<String>,
) -> Result<ScriptDescriptor> {
    let mut descriptor = match (script, file) {
        (Some(script), _) => ScriptDescriptor::inline(script),
        (None, Some(file)) => ScriptDescriptor::from_file(file),
        (None, None) => bail!("Either --script or --file is required"),
    };

    descriptor = descriptor.with_args(args);
    if let Some(node) = node {
        descriptor = descriptor.with_node_filter(node);
    }
    if let Some(project) = project {
        descriptor = descriptor.with_project(project);
    }

    Ok(descriptor)
}

async fn run_script(config: Config, path: PathBuf, descriptor: ScriptDescriptor) -> Result<i32> {
    let project_path = path.canonicalize()?;
    let dispatcher = Arc::new(LocalScriptDispatcher::new(
        project_path.clone(),
        config.dispatch.clone(),
    ));
    let context = Arc::new(ExecutionContext::new(
        project_path,
        Arc::new(config),
        dispatcher,
    ));

    let factory = ExecutionServiceFactory::instance();
    let service = factory.create_execution_service_with_listener(context, Arc::new(TracingListener));
    let item = ExecutionServiceFactory::create_dispatched_script_execution_item(Arc::new(descriptor));

    let result = match service.execute_item(&item).await {
        Ok(result) => result,
        Err(e) if e.is_resolution_error() => {
            bail!("{}. Run `exec-dispatch kinds` to list registered executors", e)
        }
        Err(e) => return Err(e.into()),
    };

    print!("{}", result.output);
    if let Some(error) = &result.error {
        eprintln!("Error: {}", error);
    }

    Ok(result.exit_code.unwrap_or(if result.success { 0 } else { 1 }))
}

fn list_kinds() {
    let snapshot = ExecutionServiceFactory::instance().registry_snapshot();

    println!("Registered execution item kinds:");
    for kind in snapshot.kinds() {
        if let Some(binding) = snapshot.binding(&kind) {
            let origin = if kind.is_builtin() { "built-in" } else { "custom" };
            println!("  {:<24} {:<9} {}", kind, origin, binding.describe());
        }
    }
}

fn init_config() -> Result<()> {
    let config_path = Config::config_path()?;
    if Config::init_at(&config_path)? {
        println!("Default configuration written to: {:?}", config_path);
    } else {
        println!("Configuration already exists at: {:?}", config_path);
    }
    Ok(())
}

fn handle_config(
    mut config: Config,
    show: bool,
    timeout: Option<u64>,
    shell: Option<String>,
    local_node: Option<String>,
) -> Result<()> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut changed = false;

    if let Some(timeout) = timeout {
        config.dispatch.script_timeout_secs = timeout;
        changed = true;
        println!("Script timeout updated");
    }

    if let Some(shell) = shell {
        config.dispatch.shell = shell;
        changed = true;
        println!("Shell updated");
    }

    if let Some(node) = local_node {
        config.dispatch.local_node = node;
        changed = true;
        println!("Local node updated");
    }

    if changed {
        config.save()?;
        println!("Configuration saved to: {:?}", Config::config_path()?);
    } else {
        println!("No changes made. Use --show to view current configuration.");
    }

    Ok(())
}
