use anyhow::Result;
use runner_provision::launch::write_launch_plan;
use runner_provision::{acquire_runtime_lock, build_launch_plan, run, stage};
use runner_utils::runtime_paths;
use tracing::info;

use crate::commands::build;
use crate::config::Settings;

/// Build (unless skipped), stage, then run the vendor server.
/// Returns the vendor server's exit code.
pub async fn exec(settings: &Settings, skip_build: bool) -> Result<i32> {
    if skip_build {
        info!("skipping plugin build");
    } else if settings.build_command.is_some() {
        build::exec(settings).await?;
    } else {
        info!("no build command configured, using existing build output");
    }

    let _lock = acquire_runtime_lock(&settings.runtime_dir)?;

    let request = settings.stage_request()?;
    let marker = stage(&request).await?;
    if let Some(version) = &marker.version {
        info!("staged plugin version {version}");
    }

    let plan = build_launch_plan(&settings.launch_options());
    let paths = runtime_paths(&settings.runtime_dir, &settings.plugins_dir);
    write_launch_plan(&paths.launch_plan_path, &plan).await?;

    info!(
        "starting vendor server in {}: {} {}",
        plan.cwd.display(),
        plan.program,
        plan.argv.join(" ")
    );
    let outcome = run(&plan).await?;
    Ok(outcome.code())
}
