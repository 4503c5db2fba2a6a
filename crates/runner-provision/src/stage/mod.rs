use std::path::PathBuf;

use log::info;
use runner_utils::runtime_paths;

use crate::errors::ProvisionError;

mod artifact;
mod marker;
mod staging;

pub use artifact::{
    find_stale_plugins, install_artifacts, matching_artifacts, select_artifacts,
    stage_plugin_artifact, ArtifactSource,
};
pub use marker::{read_staged_marker, write_staged_marker, StagedMarker, StagedPlugin};
pub use staging::{copy_into_place, ensure_dir, ensure_directories, stage_server_executable};

/// Inputs for one staging run. All paths are expected to be absolute.
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub server_jar: PathBuf,
    pub artifact: ArtifactSource,
    pub allow_multiple_artifacts: bool,
    pub runtime_dir: PathBuf,
    pub plugins_dir_name: String,
}

/// Populates the runtime dir so the vendor server can start from it.
///
/// Inputs are validated before anything is written: a missing vendor
/// executable or an unresolvable plugin artifact fails without touching
/// the plugins dir.
pub async fn stage(req: &StageRequest) -> Result<StagedMarker, ProvisionError> {
    // 1) Vendor executable must exist
    if !staging::is_regular_file(&req.server_jar).await {
        return Err(ProvisionError::MissingSourceFile {
            path: req.server_jar.clone(),
        });
    }

    // 2) Resolve plugin artifacts
    let artifacts = select_artifacts(&req.artifact, req.allow_multiple_artifacts).await?;

    // 3) Runtime layout
    let paths = runtime_paths(&req.runtime_dir, &req.plugins_dir_name);
    ensure_directories(&paths.runtime_dir, &paths.plugins_dir).await?;

    // 4) server.jar
    let server_jar = stage_server_executable(&req.server_jar, &paths.runtime_dir).await?;

    // 5) Plugins
    let installed = install_artifacts(&artifacts, &paths.plugins_dir).await?;
    artifact::warn_stale_plugins(&paths.plugins_dir, &installed)?;

    // 6) Marker
    let marker = marker::build_marker(req.artifact.version(), &server_jar, &installed).await?;
    write_staged_marker(&paths.marker_path, &marker).await?;

    info!(
        "runtime dir {} staged with {} plugin(s)",
        paths.runtime_dir.display(),
        installed.len()
    );
    Ok(marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("runner-provision-{prefix}-{nanos}"))
    }

    struct Project {
        root: PathBuf,
        request: StageRequest,
    }

    fn project(prefix: &str, artifacts: &[&str]) -> Project {
        let root = unique_temp_dir(prefix);
        let vendor_dir = root.join("server").join("Server");
        let libs = root.join("build").join("libs");
        std::fs::create_dir_all(&vendor_dir).expect("create vendor dir");
        std::fs::create_dir_all(&libs).expect("create libs");
        std::fs::write(vendor_dir.join("HytaleServer.jar"), b"vendor-server-bytes").expect("write vendor jar");
        for name in artifacts {
            std::fs::write(libs.join(name), format!("plugin:{name}")).expect("write artifact");
        }

        let request = StageRequest {
            server_jar: vendor_dir.join("HytaleServer.jar"),
            artifact: ArtifactSource::VersionSuffix {
                build_output_dir: libs,
                version: "1.0.0".into(),
            },
            allow_multiple_artifacts: false,
            runtime_dir: root.join(".server"),
            plugins_dir_name: "mods".into(),
        };
        Project { root, request }
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn stage_produces_the_runtime_layout() {
        let p = project("layout", &["Gravestones-1.0.0.jar", "Gravestones-0.9.0.jar"]);

        let marker = stage(&p.request).await.expect("stage");

        let runtime = &p.request.runtime_dir;
        assert_eq!(
            std::fs::read(runtime.join("server.jar")).expect("read server.jar"),
            std::fs::read(&p.request.server_jar).expect("read vendor jar")
        );
        assert_eq!(dir_names(&runtime.join("mods")), vec!["Gravestones-1.0.0.jar"]);
        assert_eq!(marker.version.as_deref(), Some("1.0.0"));
        assert_eq!(marker.plugins.len(), 1);
        assert_eq!(marker.plugins[0].file_name, "Gravestones-1.0.0.jar");

        let on_disk = read_staged_marker(&runtime.join(".runner").join("staged.json"))
            .await
            .expect("read marker")
            .expect("marker present");
        assert_eq!(on_disk, marker);
        let _ = std::fs::remove_dir_all(&p.root);
    }

    #[tokio::test]
    async fn staging_twice_yields_the_same_contents() {
        let p = project("idempotent", &["Gravestones-1.0.0.jar"]);

        let first = stage(&p.request).await.expect("first stage");
        let second = stage(&p.request).await.expect("second stage");

        assert_eq!(first.server_jar_sha256, second.server_jar_sha256);
        assert_eq!(first.plugins, second.plugins);
        assert_eq!(dir_names(&p.request.runtime_dir), vec![".runner", "mods", "server.jar"]);
        let _ = std::fs::remove_dir_all(&p.root);
    }

    #[tokio::test]
    async fn missing_vendor_executable_fails_before_creating_dirs() {
        let p = project("no-vendor", &["Gravestones-1.0.0.jar"]);
        std::fs::remove_file(&p.request.server_jar).expect("remove vendor jar");

        let err = stage(&p.request).await.expect_err("missing vendor jar");
        assert!(matches!(err, ProvisionError::MissingSourceFile { .. }));
        assert!(!p.request.runtime_dir.join("mods").exists());
        let _ = std::fs::remove_dir_all(&p.root);
    }

    #[tokio::test]
    async fn no_matching_artifact_copies_nothing() {
        let p = project("no-artifact", &["Gravestones-0.9.0.jar"]);

        let err = stage(&p.request).await.expect_err("no artifact");
        assert!(matches!(err, ProvisionError::NoArtifactFound { .. }));
        assert!(!p.request.runtime_dir.join("mods").exists());
        assert!(!p.request.runtime_dir.join("server.jar").exists());
        let _ = std::fs::remove_dir_all(&p.root);
    }

    #[tokio::test]
    async fn ambiguous_artifacts_copy_nothing() {
        let p = project("ambiguous", &["Gravestones-1.0.0.jar", "Gravestones-dev-1.0.0.jar"]);

        let err = stage(&p.request).await.expect_err("ambiguous");
        assert!(err.to_string().contains("refusing to pick one"));
        assert!(!p.request.runtime_dir.join("mods").exists());
        let _ = std::fs::remove_dir_all(&p.root);
    }

    #[tokio::test]
    async fn explicit_artifact_skips_scanning() {
        let mut p = project("explicit", &[]);
        let jar = p.root.join("out").join("custom-name.jar");
        std::fs::create_dir_all(jar.parent().expect("parent")).expect("create out");
        std::fs::write(&jar, b"explicit").expect("write jar");
        p.request.artifact = ArtifactSource::Explicit(jar);

        let marker = stage(&p.request).await.expect("stage");
        assert_eq!(marker.version, None);
        assert_eq!(dir_names(&p.request.runtime_dir.join("mods")), vec!["custom-name.jar"]);
        let _ = std::fs::remove_dir_all(&p.root);
    }

    #[tokio::test]
    async fn earlier_plugin_versions_are_left_in_place() {
        let p = project("stale", &["Gravestones-1.0.0.jar"]);
        let mods = p.request.runtime_dir.join("mods");
        std::fs::create_dir_all(&mods).expect("create mods");
        std::fs::write(mods.join("Gravestones-0.9.0.jar"), b"old").expect("write old");

        stage(&p.request).await.expect("stage");
        assert_eq!(
            dir_names(&mods),
            vec!["Gravestones-0.9.0.jar", "Gravestones-1.0.0.jar"]
        );
        let _ = std::fs::remove_dir_all(&p.root);
    }
}
