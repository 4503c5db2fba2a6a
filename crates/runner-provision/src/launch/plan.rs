use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_JAVA: &str = "java";
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

pub fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub program: String,   // usually "java"
    pub argv: Vec<String>, // e.g. ["-jar","server.jar","--assets","/abs/Assets.zip","--bind","0.0.0.0:5000"]
    pub cwd: PathBuf,      // the runtime dir
}

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub java: String,
    pub jvm_args: Vec<String>,
    pub runtime_dir: PathBuf,
    pub project_root: PathBuf,
    pub assets_path: PathBuf,
    pub bind: SocketAddr,
}
