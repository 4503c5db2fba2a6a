use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use runner_provision::ProvisionError;
use runner_utils::ProjectPaths;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use config::{Overrides, RunnerConfig, Settings};

/// Exit code for failures before the vendor server is started.
const EXIT_SETUP_FAILED: i32 = 125;
/// Exit code when the vendor server could not be started at all.
const EXIT_LAUNCH_FAILED: i32 = 126;

#[derive(Parser)]
#[command(name = "mod-runner")]
#[command(about = "Builds a server plugin, stages it next to the vendor server and runs it", long_about = None)]
struct Cli {
    /// Project root; relative paths in the config are resolved against it
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    project_root: Option<PathBuf>,
    /// Config file (default: <project-root>/runner.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured plugin build
    Build,
    /// Stage the runtime directory and start the vendor server
    RunServer {
        /// Assets archive passed to the server
        #[arg(long, value_name = "PATH")]
        assets_path: Option<PathBuf>,
        /// Bind address (default 0.0.0.0:5000)
        #[arg(long, value_name = "ADDR:PORT")]
        bind: Option<String>,
        /// Runtime directory (default .server)
        #[arg(long, value_name = "DIR")]
        runtime_dir: Option<PathBuf>,
        /// Install build outputs ending in <VERSION>.jar
        #[arg(long, value_name = "VERSION")]
        plugin_version: Option<String>,
        /// Install this jar instead of scanning the build output
        #[arg(long, value_name = "FILE")]
        artifact: Option<PathBuf>,
        /// Do not run the build command first
        #[arg(long)]
        skip_build: bool,
    },
    /// Show what is staged in the runtime directory
    Status {
        /// Runtime directory (default .server)
        #[arg(long, value_name = "DIR")]
        runtime_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            exit_code_for(&err)
        }
    };

    std::process::exit(code);
}

async fn dispatch(cli: Cli) -> Result<i32> {
    let project_root = match cli.project_root {
        Some(dir) => std::path::absolute(&dir)
            .with_context(|| format!("Invalid project root {}", dir.display()))?,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let config_path = match cli.config {
        Some(path) => runner_utils::resolve_against(&project_root, &path),
        None => ProjectPaths::with_defaults(&project_root).config_path(),
    };
    let config = RunnerConfig::load_or_default(&config_path).await?;

    match cli.command {
        Commands::Build => {
            let settings = Settings::resolve(&project_root, config, Overrides::default())?;
            commands::build::exec(&settings).await?;
            Ok(0)
        }
        Commands::RunServer {
            assets_path,
            bind,
            runtime_dir,
            plugin_version,
            artifact,
            skip_build,
        } => {
            let overrides = Overrides {
                assets_path,
                bind,
                runtime_dir,
                plugin_version,
                artifact,
            };
            let settings = Settings::resolve(&project_root, config, overrides)?;
            commands::run_server::exec(&settings, skip_build).await
        }
        Commands::Status { runtime_dir } => {
            let overrides = Overrides {
                runtime_dir,
                ..Overrides::default()
            };
            let settings = Settings::resolve(&project_root, config, overrides)?;
            commands::status::exec(&settings).await?;
            Ok(0)
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::LaunchFailed { .. }) => EXIT_LAUNCH_FAILED,
        _ => EXIT_SETUP_FAILED,
    }
}
