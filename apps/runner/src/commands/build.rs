use anyhow::{Context, Result};
use runner_provision::stage::select_artifacts;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no build command configured; set `build_command` in runner.toml")]
    NotConfigured,

    #[error("build command `{command}` exited with code {code}")]
    BuildFailed { command: String, code: i32 },

    #[error("build command `{command}` was terminated by a signal")]
    Terminated { command: String },
}

/// Runs the configured build command from the project root.
pub async fn exec(settings: &Settings) -> Result<()> {
    let Some((program, args)) = settings
        .build_command
        .as_deref()
        .and_then(|argv| argv.split_first())
    else {
        return Err(BuildError::NotConfigured.into());
    };
    let command = settings.build_command.as_deref().unwrap_or_default().join(" ");

    info!("building plugin: {command}");
    let status = Command::new(program)
        .args(args)
        .current_dir(&settings.project_root)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to start build command `{program}`"))?;

    if !status.success() {
        let err = match status.code() {
            Some(code) => BuildError::BuildFailed { command, code },
            None => BuildError::Terminated { command },
        };
        return Err(err.into());
    }

    report_artifacts(settings).await;
    Ok(())
}

async fn report_artifacts(settings: &Settings) {
    let Ok(source) = settings.artifact_source() else {
        return;
    };
    match select_artifacts(&source, settings.allow_multiple_artifacts).await {
        Ok(paths) => {
            for path in paths {
                info!("plugin artifact: {}", path.display());
            }
        }
        Err(err) => warn!("build finished but the plugin artifact is not usable: {err}"),
    }
}
