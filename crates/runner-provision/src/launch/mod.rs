use std::path::{Path, PathBuf};

use log::{debug, warn};
use runner_utils::{resolve_against, SERVER_JAR_NAME};

use crate::errors::ProvisionError;

mod plan;
mod run;

pub use plan::{default_bind, LaunchOptions, LaunchPlan, DEFAULT_BIND, DEFAULT_JAVA};
pub use run::{run, ExitOutcome};

/// The vendor server only accepts an absolute assets path.
pub fn resolve_assets_path(project_root: &Path, assets_path: &Path) -> PathBuf {
    resolve_against(project_root, assets_path)
}

pub fn build_launch_plan(opts: &LaunchOptions) -> LaunchPlan {
    let assets = resolve_assets_path(&opts.project_root, &opts.assets_path);
    if !assets.exists() {
        warn!("assets not found at {}, starting anyway", assets.display());
    }

    let mut argv = opts.jvm_args.clone();
    argv.extend([
        "-jar".to_string(),
        SERVER_JAR_NAME.to_string(),
        "--assets".to_string(),
        assets.to_string_lossy().to_string(),
        "--bind".to_string(),
        opts.bind.to_string(),
    ]);

    let plan = LaunchPlan {
        program: opts.java.clone(),
        argv,
        cwd: opts.runtime_dir.clone(),
    };
    debug!("launch plan: {} {:?} (cwd {})", plan.program, plan.argv, plan.cwd.display());
    plan
}

pub async fn write_launch_plan(launch_plan_path: &Path, plan: &LaunchPlan) -> Result<(), ProvisionError> {
    if let Some(dir) = launch_plan_path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let bytes = serde_json::to_vec_pretty(plan)?;
    tokio::fs::write(launch_plan_path, bytes).await?;
    Ok(())
}

/// `None` when the server has not been launched from this runtime dir yet.
pub async fn read_launch_plan(launch_plan_path: &Path) -> Result<Option<LaunchPlan>, ProvisionError> {
    if !tokio::fs::try_exists(launch_plan_path).await? {
        return Ok(None);
    }
    let bytes = tokio::fs::read(launch_plan_path).await?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}
