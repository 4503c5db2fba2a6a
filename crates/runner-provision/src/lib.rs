pub mod errors;

pub mod launch;
pub mod lock;
pub mod stage;

mod hashing;

pub use errors::ProvisionError;
pub use launch::{build_launch_plan, run, ExitOutcome, LaunchOptions, LaunchPlan};
pub use lock::{acquire_runtime_lock, RuntimeLock};
pub use stage::{stage, ArtifactSource, StageRequest, StagedMarker};

pub(crate) fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
