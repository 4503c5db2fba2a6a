use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::errors::ProvisionError;

pub(crate) fn sha256_file(path: &Path) -> Result<String, ProvisionError> {
    let file = File::open(path).map_err(ProvisionError::staging(path))?;
    let mut reader = BufReader::new(file);
    let mut h = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf).map_err(ProvisionError::staging(path))?;
        if n == 0 {
            break;
        }
        h.update(&buf[..n]);
    }

    Ok(hex::encode(h.finalize()))
}

/// Hashes off the async runtime; staged jars can be large.
pub(crate) async fn sha256_file_async(path: &Path) -> Result<String, ProvisionError> {
    let owned: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || sha256_file(&owned))
        .await
        .map_err(|e| ProvisionError::Io(std::io::Error::other(format!("hash task failed: {e}"))))?
}
