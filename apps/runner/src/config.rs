use anyhow::{bail, Context, Result};
use runner_provision::launch::{default_bind, LaunchOptions, DEFAULT_JAVA};
use runner_provision::{ArtifactSource, StageRequest};
use runner_utils::{resolve_against, ProjectPaths, DEFAULT_PLUGINS_DIR};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Contents of `runner.toml`. Every key is optional.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    pub server_jar: Option<PathBuf>,
    pub build_output_dir: Option<PathBuf>,
    pub plugin_version: Option<String>,
    pub artifact: Option<PathBuf>,
    pub allow_multiple_artifacts: bool,
    pub runtime_dir: Option<PathBuf>,
    pub plugins_dir: Option<String>,
    pub assets_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub java: Option<String>,
    pub jvm_args: Vec<String>,
    pub build_command: Option<Vec<String>>,
}

impl RunnerConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// A missing file means defaults; a present but broken one is an error.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }
        Self::load(path).await
    }
}

/// Command-line values that win over `runner.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub assets_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub runtime_dir: Option<PathBuf>,
    pub plugin_version: Option<String>,
    pub artifact: Option<PathBuf>,
}

/// Fully resolved settings; every path is absolute.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_root: PathBuf,
    pub server_jar: PathBuf,
    pub build_output_dir: PathBuf,
    pub plugin_version: Option<String>,
    pub artifact: Option<PathBuf>,
    pub allow_multiple_artifacts: bool,
    pub runtime_dir: PathBuf,
    pub plugins_dir: String,
    pub assets_path: PathBuf,
    pub bind: SocketAddr,
    pub java: String,
    pub jvm_args: Vec<String>,
    pub build_command: Option<Vec<String>>,
}

impl Settings {
    pub fn resolve(project_root: &Path, config: RunnerConfig, overrides: Overrides) -> Result<Self> {
        let defaults = ProjectPaths::with_defaults(project_root);
        let anchor = |value: Option<PathBuf>, default: PathBuf| match value {
            Some(p) => resolve_against(project_root, &p),
            None => default,
        };

        let bind = match overrides.bind.or(config.bind) {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid bind address `{raw}`, expected address:port"))?,
            None => default_bind(),
        };

        let plugins_dir = config
            .plugins_dir
            .unwrap_or_else(|| DEFAULT_PLUGINS_DIR.to_string());
        if !is_single_dir_name(&plugins_dir) {
            bail!("`plugins_dir` must be a single directory name, got `{plugins_dir}`");
        }

        let build_command = match config.build_command {
            Some(argv) if argv.is_empty() => bail!("`build_command` must not be empty"),
            Some(argv) => Some(argv),
            None => default_build_command(project_root),
        };

        Ok(Self {
            server_jar: anchor(config.server_jar, defaults.server_jar),
            build_output_dir: anchor(config.build_output_dir, defaults.build_output_dir),
            plugin_version: overrides
                .plugin_version
                .or(config.plugin_version)
                .or_else(|| gradle_project_version(project_root))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            artifact: overrides
                .artifact
                .or(config.artifact)
                .map(|p| resolve_against(project_root, &p)),
            allow_multiple_artifacts: config.allow_multiple_artifacts,
            runtime_dir: anchor(overrides.runtime_dir.or(config.runtime_dir), defaults.runtime_dir),
            plugins_dir,
            assets_path: anchor(overrides.assets_path.or(config.assets_path), defaults.assets_path),
            bind,
            java: config.java.unwrap_or_else(|| DEFAULT_JAVA.to_string()),
            jvm_args: config.jvm_args,
            build_command,
            project_root: defaults.project_root,
        })
    }

    /// An explicit artifact wins over version matching.
    pub fn artifact_source(&self) -> Result<ArtifactSource> {
        if let Some(path) = &self.artifact {
            return Ok(ArtifactSource::Explicit(path.clone()));
        }
        let Some(version) = &self.plugin_version else {
            bail!(
                "No plugin version configured; set `plugin_version` in runner.toml or pass --plugin-version"
            );
        };
        Ok(ArtifactSource::VersionSuffix {
            build_output_dir: self.build_output_dir.clone(),
            version: version.clone(),
        })
    }

    pub fn stage_request(&self) -> Result<StageRequest> {
        Ok(StageRequest {
            server_jar: self.server_jar.clone(),
            artifact: self.artifact_source()?,
            allow_multiple_artifacts: self.allow_multiple_artifacts,
            runtime_dir: self.runtime_dir.clone(),
            plugins_dir_name: self.plugins_dir.clone(),
        })
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            java: self.java.clone(),
            jvm_args: self.jvm_args.clone(),
            runtime_dir: self.runtime_dir.clone(),
            project_root: self.project_root.clone(),
            assets_path: self.assets_path.clone(),
            bind: self.bind,
        }
    }
}

fn is_single_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// `./gradlew build` when the project ships a Gradle wrapper.
fn default_build_command(project_root: &Path) -> Option<Vec<String>> {
    if !project_root.join("gradlew").is_file() {
        return None;
    }
    Some(vec!["./gradlew".to_string(), "build".to_string()])
}

/// Reads `version = "..."` from the Gradle build script, if there is one.
fn gradle_project_version(project_root: &Path) -> Option<String> {
    ["build.gradle.kts", "build.gradle"]
        .iter()
        .filter_map(|name| std::fs::read_to_string(project_root.join(name)).ok())
        .find_map(|script| parse_gradle_version(&script))
}

fn parse_gradle_version(script: &str) -> Option<String> {
    script.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("version")?;
        let value = rest.trim_start().strip_prefix('=')?.trim();
        let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let inner = &value[1..];
        let end = inner.find(quote)?;
        Some(inner[..end].to_string()).filter(|v| !v.is_empty())
    })
}
