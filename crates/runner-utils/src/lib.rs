use std::path::{Component, Path, PathBuf};

/// Default project layout, relative to the project root.
pub const DEFAULT_SERVER_JAR: &str = "server/Server/HytaleServer.jar";
pub const DEFAULT_BUILD_OUTPUT_DIR: &str = "build/libs";
pub const DEFAULT_RUNTIME_DIR: &str = ".server";
pub const DEFAULT_PLUGINS_DIR: &str = "mods";
pub const DEFAULT_ASSETS_PATH: &str = "server/Assets.zip";
pub const CONFIG_FILE_NAME: &str = "runner.toml";

/// Name the vendor executable is copied to inside the runtime dir.
pub const SERVER_JAR_NAME: &str = "server.jar";

/// Bookkeeping dir inside the runtime dir.
const RUNNER_DIR: &str = ".runner";

pub struct ProjectPaths {
    pub project_root: PathBuf,
    pub server_jar: PathBuf,
    pub build_output_dir: PathBuf,
    pub runtime_dir: PathBuf,
    pub assets_path: PathBuf,
}

impl ProjectPaths {
    /// All defaults anchored at `project_root`.
    pub fn with_defaults(project_root: &Path) -> Self {
        Self {
            server_jar: project_root.join(DEFAULT_SERVER_JAR),
            build_output_dir: project_root.join(DEFAULT_BUILD_OUTPUT_DIR),
            runtime_dir: project_root.join(DEFAULT_RUNTIME_DIR),
            assets_path: project_root.join(DEFAULT_ASSETS_PATH),
            project_root: project_root.to_path_buf(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_root.join(CONFIG_FILE_NAME)
    }
}

pub struct RuntimePaths {
    pub runtime_dir: PathBuf,
    pub server_jar: PathBuf,
    pub plugins_dir: PathBuf,
    pub runner_dir: PathBuf,
    pub lock_path: PathBuf,
    pub marker_path: PathBuf,
    pub launch_plan_path: PathBuf,
}

pub fn runtime_paths(runtime_dir: &Path, plugins_dir_name: &str) -> RuntimePaths {
    let runner_dir = runner_dir(runtime_dir);
    RuntimePaths {
        server_jar: runtime_dir.join(SERVER_JAR_NAME),
        plugins_dir: runtime_dir.join(plugins_dir_name),
        lock_path: lock_path(runtime_dir),
        marker_path: runner_dir.join("staged.json"),
        launch_plan_path: runner_dir.join("launch.json"),
        runner_dir,
        runtime_dir: runtime_dir.to_path_buf(),
    }
}

/// Bookkeeping files live here; the vendor server never reads it.
pub fn runner_dir(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join(RUNNER_DIR)
}

/// Held for the whole stage-and-run sequence.
pub fn lock_path(runtime_dir: &Path) -> PathBuf {
    runner_dir(runtime_dir).join("lock")
}

pub fn ensure_dir(p: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(p)
}

/// Joins `path` onto `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Lexical normalization: drops `.` and folds `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
