use std::process::{ExitStatus, Stdio};

use log::{info, warn};
use tokio::process::{Child, Command};

use crate::errors::ProvisionError;

use super::LaunchPlan;

/// How the vendor process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(i32),
    Unknown,
}

impl ExitOutcome {
    /// Shell convention: a child killed by signal `n` reports `128 + n`.
    pub fn code(&self) -> i32 {
        match *self {
            ExitOutcome::Exited(code) => code,
            ExitOutcome::Signaled(signal) => 128 + signal,
            ExitOutcome::Unknown => 1,
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }
        ExitOutcome::Unknown
    }
}

/// Starts the vendor server and blocks until it exits.
///
/// The child inherits stdin, stdout and stderr, so console commands typed by
/// the operator reach it directly. Termination signals received meanwhile are
/// passed on to the child and we keep waiting for it to exit.
pub async fn run(plan: &LaunchPlan) -> Result<ExitOutcome, ProvisionError> {
    let mut cmd = Command::new(&plan.program);
    cmd.args(&plan.argv)
        .current_dir(&plan.cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| ProvisionError::LaunchFailed {
        program: plan.program.clone(),
        source,
    })?;
    info!(
        "vendor server started (pid {})",
        child.id().map(|id| id.to_string()).unwrap_or_else(|| "?".into())
    );

    let status = wait_forwarding_signals(&mut child).await?;
    let outcome = ExitOutcome::from(status);
    info!("vendor server exited with code {}", outcome.code());
    Ok(outcome)
}

#[cfg(unix)]
async fn wait_forwarding_signals(child: &mut Child) -> Result<ExitStatus, ProvisionError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        let forwarded = tokio::select! {
            status = child.wait() => return Ok(status?),
            _ = interrupt.recv() => libc::SIGINT,
            _ = terminate.recv() => libc::SIGTERM,
            _ = hangup.recv() => libc::SIGHUP,
        };
        forward_signal(child, forwarded);
    }
}

#[cfg(unix)]
fn forward_signal(child: &Child, signal: libc::c_int) {
    let Some(pid) = child.id() else {
        return;
    };
    info!("forwarding signal {signal} to vendor server (pid {pid})");
    // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet.
    let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if rc != 0 {
        warn!(
            "failed to forward signal {signal} to pid {pid}: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
async fn wait_forwarding_signals(child: &mut Child) -> Result<ExitStatus, ProvisionError> {
    loop {
        tokio::select! {
            status = child.wait() => return Ok(status?),
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("interrupt received, stopping vendor server");
                if let Err(e) = child.start_kill() {
                    warn!("failed to stop vendor server: {e}");
                }
            }
        }
    }
}
