use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;

use crate::errors::ProvisionError;

use super::staging::{copy_into_place, is_regular_file};

/// Where the plugin jar comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// A single file handed over by the build step.
    Explicit(PathBuf),
    /// Every regular file in `build_output_dir` whose name ends with `<version>.jar`.
    VersionSuffix {
        build_output_dir: PathBuf,
        version: String,
    },
}

impl ArtifactSource {
    pub fn version(&self) -> Option<&str> {
        match self {
            ArtifactSource::Explicit(_) => None,
            ArtifactSource::VersionSuffix { version, .. } => Some(version),
        }
    }
}

/// Resolves the artifacts to install without copying anything.
pub async fn select_artifacts(
    source: &ArtifactSource,
    allow_multiple: bool,
) -> Result<Vec<PathBuf>, ProvisionError> {
    match source {
        ArtifactSource::Explicit(path) => {
            if !is_regular_file(path).await {
                return Err(ProvisionError::MissingSourceFile { path: path.clone() });
            }
            Ok(vec![path.clone()])
        }
        ArtifactSource::VersionSuffix {
            build_output_dir,
            version,
        } => {
            let matches = matching_artifacts(build_output_dir, version)?;
            if matches.is_empty() {
                return Err(ProvisionError::NoArtifactFound {
                    dir: build_output_dir.clone(),
                    version: version.clone(),
                });
            }
            if matches.len() > 1 && !allow_multiple {
                return Err(ProvisionError::AmbiguousArtifact {
                    version: version.clone(),
                    candidates: matches,
                });
            }
            Ok(matches)
        }
    }
}

/// Top-level regular files in `dir` named `*<version>.jar`, sorted by name.
/// A missing directory yields no matches.
pub fn matching_artifacts(dir: &Path, version: &str) -> Result<Vec<PathBuf>, ProvisionError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let suffix = format!("{version}.jar");
    let mut out = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ProvisionError::StagingFailed {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(&suffix) {
            out.push(entry.into_path());
        }
    }

    Ok(out)
}

/// Copies each artifact into `plugins_dir`, keeping its file name.
pub async fn install_artifacts(
    artifacts: &[PathBuf],
    plugins_dir: &Path,
) -> Result<Vec<PathBuf>, ProvisionError> {
    let mut installed = Vec::with_capacity(artifacts.len());
    for src in artifacts {
        let Some(name) = src.file_name() else {
            return Err(ProvisionError::MissingSourceFile { path: src.clone() });
        };
        let dest = plugins_dir.join(name);
        let bytes = copy_into_place(src, &dest).await?;
        info!("installed plugin {} ({bytes} bytes)", dest.display());
        installed.push(dest);
    }
    Ok(installed)
}

/// Scans `build_output_dir` for `*<version>.jar` and installs every match.
pub async fn stage_plugin_artifact(
    build_output_dir: &Path,
    version: &str,
    plugins_dir: &Path,
) -> Result<Vec<PathBuf>, ProvisionError> {
    let source = ArtifactSource::VersionSuffix {
        build_output_dir: build_output_dir.to_path_buf(),
        version: version.to_string(),
    };
    let artifacts = select_artifacts(&source, true).await?;
    install_artifacts(&artifacts, plugins_dir).await
}

/// Jars in `plugins_dir` that were not part of this staging run.
pub fn find_stale_plugins(plugins_dir: &Path, installed: &[PathBuf]) -> Result<Vec<PathBuf>, ProvisionError> {
    let mut stale = Vec::new();
    for entry in WalkDir::new(plugins_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ProvisionError::StagingFailed {
            path: plugins_dir.to_path_buf(),
            source: e.into(),
        })?;
        let is_jar = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"));
        if entry.file_type().is_file() && is_jar && !installed.iter().any(|p| p == entry.path()) {
            stale.push(entry.into_path());
        }
    }
    Ok(stale)
}

pub(crate) fn warn_stale_plugins(plugins_dir: &Path, installed: &[PathBuf]) -> Result<(), ProvisionError> {
    let stale = find_stale_plugins(plugins_dir, installed)?;
    for path in &stale {
        warn!(
            "leftover plugin jar from an earlier run is still installed: {}",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("runner-provision-{prefix}-{nanos}"))
    }

    fn build_output(dir: &Path, names: &[&str]) -> PathBuf {
        let libs = dir.join("build").join("libs");
        std::fs::create_dir_all(&libs).expect("create libs");
        for name in names {
            std::fs::write(libs.join(name), name.as_bytes()).expect("write artifact");
        }
        libs
    }

    #[test]
    fn suffix_match_ignores_other_versions_and_directories() {
        let dir = unique_temp_dir("match");
        let libs = build_output(&dir, &["Gravestones-1.0.0.jar", "Gravestones-0.9.0.jar", "notes.txt"]);
        std::fs::create_dir_all(libs.join("nested-1.0.0.jar")).expect("create decoy dir");

        let found = matching_artifacts(&libs, "1.0.0").expect("scan");
        assert_eq!(found, vec![libs.join("Gravestones-1.0.0.jar")]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn zero_matches_is_no_artifact_found() {
        let dir = unique_temp_dir("zero");
        let libs = build_output(&dir, &["Gravestones-0.9.0.jar"]);
        let source = ArtifactSource::VersionSuffix {
            build_output_dir: libs.clone(),
            version: "1.0.0".into(),
        };

        let err = select_artifacts(&source, false).await.expect_err("no match");
        match err {
            ProvisionError::NoArtifactFound { dir: d, version } => {
                assert_eq!(d, libs);
                assert_eq!(version, "1.0.0");
            }
            other => panic!("unexpected error: {other}"),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn multiple_matches_fail_unless_allowed() {
        let dir = unique_temp_dir("multi");
        let libs = build_output(&dir, &["a-1.0.0.jar", "b-1.0.0.jar"]);
        let source = ArtifactSource::VersionSuffix {
            build_output_dir: libs.clone(),
            version: "1.0.0".into(),
        };

        let err = select_artifacts(&source, false).await.expect_err("ambiguous");
        assert!(matches!(err, ProvisionError::AmbiguousArtifact { ref candidates, .. } if candidates.len() == 2));

        let all = select_artifacts(&source, true).await.expect("allowed");
        assert_eq!(all, vec![libs.join("a-1.0.0.jar"), libs.join("b-1.0.0.jar")]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn explicit_artifact_must_exist() {
        let dir = unique_temp_dir("explicit");
        let path = dir.join("plugin.jar");
        let err = select_artifacts(&ArtifactSource::Explicit(path.clone()), false)
            .await
            .expect_err("missing explicit artifact");
        assert!(matches!(err, ProvisionError::MissingSourceFile { path: p } if p == path));
    }

    #[tokio::test]
    async fn stage_plugin_artifact_copies_every_match() {
        let dir = unique_temp_dir("stage-plugins");
        let libs = build_output(&dir, &["a-1.0.0.jar", "b-1.0.0.jar", "c-2.0.0.jar"]);
        let mods = dir.join("mods");
        std::fs::create_dir_all(&mods).expect("create mods");

        let installed = stage_plugin_artifact(&libs, "1.0.0", &mods)
            .await
            .expect("stage plugins");

        assert_eq!(installed, vec![mods.join("a-1.0.0.jar"), mods.join("b-1.0.0.jar")]);
        assert_eq!(std::fs::read(mods.join("a-1.0.0.jar")).expect("read"), b"a-1.0.0.jar");
        assert!(!mods.join("c-2.0.0.jar").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn stale_plugins_are_listed() {
        let dir = unique_temp_dir("stale");
        let mods = dir.join("mods");
        std::fs::create_dir_all(&mods).expect("create mods");
        std::fs::write(mods.join("plugin-0.9.0.jar"), b"old").expect("write old");
        std::fs::write(mods.join("plugin-1.0.0.jar"), b"new").expect("write new");
        std::fs::write(mods.join("config.json"), b"{}").expect("write config");

        let stale = find_stale_plugins(&mods, &[mods.join("plugin-1.0.0.jar")]).expect("scan");
        assert_eq!(stale, vec![mods.join("plugin-0.9.0.jar")]);
        let _ = std::fs::remove_dir_all(dir);
    }
}
