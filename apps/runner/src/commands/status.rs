use anyhow::Result;
use runner_provision::launch::read_launch_plan;
use runner_provision::stage::read_staged_marker;
use runner_utils::runtime_paths;

use crate::config::Settings;

pub async fn exec(settings: &Settings) -> Result<()> {
    let paths = runtime_paths(&settings.runtime_dir, &settings.plugins_dir);
    println!("Runtime dir: {}", paths.runtime_dir.display());

    let Some(marker) = read_staged_marker(&paths.marker_path).await? else {
        println!("Status: NOT STAGED");
        return Ok(());
    };

    println!("Status: STAGED");
    println!("Version: {}", marker.version.as_deref().unwrap_or("(explicit artifact)"));
    println!("server.jar sha256: {}", marker.server_jar_sha256);
    for plugin in &marker.plugins {
        println!("Plugin: {} ({})", plugin.file_name, plugin.sha256);
    }

    if let Some(plan) = read_launch_plan(&paths.launch_plan_path).await? {
        println!("Last launch: {} {}", plan.program, plan.argv.join(" "));
    }

    Ok(())
}
