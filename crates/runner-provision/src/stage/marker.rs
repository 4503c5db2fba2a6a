use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ProvisionError;
use crate::hashing::sha256_file_async;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedPlugin {
    pub file_name: String,
    pub sha256: String,
}

/// Record of what the last staging run put into the runtime dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedMarker {
    #[serde(default)]
    pub version: Option<String>,
    pub server_jar_sha256: String,
    pub plugins: Vec<StagedPlugin>,
    pub staged_at_ms: u64,
}

pub(crate) async fn build_marker(
    version: Option<&str>,
    server_jar: &Path,
    installed: &[PathBuf],
) -> Result<StagedMarker, ProvisionError> {
    let server_jar_sha256 = sha256_file_async(server_jar).await?;

    let mut plugins = Vec::with_capacity(installed.len());
    for path in installed {
        plugins.push(StagedPlugin {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            sha256: sha256_file_async(path).await?,
        });
    }

    Ok(StagedMarker {
        version: version.map(str::to_string),
        server_jar_sha256,
        plugins,
        staged_at_ms: crate::now_millis(),
    })
}

pub async fn write_staged_marker(marker_path: &Path, marker: &StagedMarker) -> Result<(), ProvisionError> {
    if let Some(dir) = marker_path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(ProvisionError::staging(dir))?;
    }
    let bytes = serde_json::to_vec_pretty(marker)?;
    tokio::fs::write(marker_path, bytes)
        .await
        .map_err(ProvisionError::staging(marker_path))?;
    Ok(())
}

/// `None` when nothing has been staged yet.
pub async fn read_staged_marker(marker_path: &Path) -> Result<Option<StagedMarker>, ProvisionError> {
    if !tokio::fs::try_exists(marker_path).await? {
        return Ok(None);
    }
    let bytes = tokio::fs::read(marker_path).await?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}
