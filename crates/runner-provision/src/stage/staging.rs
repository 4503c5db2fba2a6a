use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::info;
use runner_utils::SERVER_JAR_NAME;

use crate::errors::ProvisionError;

pub async fn ensure_dir(p: &Path) -> Result<(), ProvisionError> {
    tokio::fs::create_dir_all(p)
        .await
        .map_err(ProvisionError::staging(p))
}

/// Creates the runtime dir and its plugins dir. Existing dirs are reused.
pub async fn ensure_directories(runtime_dir: &Path, plugins_dir: &Path) -> Result<(), ProvisionError> {
    ensure_dir(runtime_dir).await?;
    ensure_dir(plugins_dir).await?;
    Ok(())
}

/// Copies the vendor executable to `<runtime_dir>/server.jar`, replacing any previous copy.
pub async fn stage_server_executable(src: &Path, runtime_dir: &Path) -> Result<PathBuf, ProvisionError> {
    if !is_regular_file(src).await {
        return Err(ProvisionError::MissingSourceFile {
            path: src.to_path_buf(),
        });
    }

    let dest = runtime_dir.join(SERVER_JAR_NAME);
    let bytes = copy_into_place(src, &dest).await?;
    info!("staged {} -> {} ({bytes} bytes)", src.display(), dest.display());
    Ok(dest)
}

/// Copies through a `.partial` sibling so `dest` never holds a half-written file.
pub async fn copy_into_place(src: &Path, dest: &Path) -> Result<u64, ProvisionError> {
    let partial = partial_path(dest);

    let bytes = match tokio::fs::copy(src, &partial).await {
        Ok(n) => n,
        Err(source) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(ProvisionError::StagingFailed {
                path: dest.to_path_buf(),
                source,
            });
        }
    };

    if let Err(source) = tokio::fs::rename(&partial, dest).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(ProvisionError::StagingFailed {
            path: dest.to_path_buf(),
            source,
        });
    }

    Ok(bytes)
}

pub(crate) async fn is_regular_file(p: &Path) -> bool {
    tokio::fs::metadata(p)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("staged"));
    name.push(".partial");
    dest.with_file_name(name)
}
