use fs2::FileExt;
use std::{fs::File, fs::OpenOptions, io::ErrorKind, path::Path, path::PathBuf};

use runner_utils::{ensure_dir, lock_path, runner_dir};

use crate::errors::ProvisionError;

/// Exclusive hold on a runtime dir. Released on drop.
pub struct RuntimeLock {
    _file: File,
    path: PathBuf,
}

impl RuntimeLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Fails with `RuntimeBusy` if another run already holds the lock.
pub fn acquire_runtime_lock(runtime_dir: &Path) -> Result<RuntimeLock, ProvisionError> {
    let dir = runner_dir(runtime_dir);
    ensure_dir(&dir).map_err(ProvisionError::staging(&dir))?;
    let path = lock_path(runtime_dir);

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&path)
        .map_err(ProvisionError::staging(&path))?;

    if let Err(e) = file.try_lock_exclusive() {
        let contended = e.kind() == ErrorKind::WouldBlock
            || e.raw_os_error() == fs2::lock_contended_error().raw_os_error();
        if contended {
            return Err(ProvisionError::RuntimeBusy { path });
        }
        return Err(ProvisionError::StagingFailed { path, source: e });
    }

    Ok(RuntimeLock { _file: file, path })
}
