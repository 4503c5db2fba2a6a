use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("source file not found: {}", path.display())]
    MissingSourceFile { path: PathBuf },

    #[error("no plugin artifact ending in `{version}.jar` found in {}", dir.display())]
    NoArtifactFound { dir: PathBuf, version: String },

    #[error(
        "{} plugin artifacts match `{version}.jar`, refusing to pick one: {}",
        candidates.len(),
        display_paths(candidates)
    )]
    AmbiguousArtifact { version: String, candidates: Vec<PathBuf> },

    #[error("staging failed at {}: {source}", path.display())]
    StagingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start `{program}`: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("runtime directory is in use by another run (lock held at {})", path.display())]
    RuntimeBusy { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ProvisionError {
    pub(crate) fn staging(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ProvisionError::StagingFailed { path, source }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
