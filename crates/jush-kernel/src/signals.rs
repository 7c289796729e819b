//! Signal tasks — the reaper and the interrupt forwarders.
//!
//! The original installed SIGCHLD/SIGINT/SIGTSTP handlers; here each signal
//! is a `tokio::signal::unix` stream consumed by a dedicated task. Handler
//! bodies become ordinary task code, and mutual exclusion with the read-eval
//! loop comes from the table lock instead of a blocked-signal mask: the
//! reaper's whole drain runs under it.
//!
//! Streams coalesce deliveries exactly like the signals they wrap, so the
//! reaper drains every pending child status per wakeup rather than assuming
//! one delivery per child.

use std::sync::Arc;

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{killpg, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

use jush_types::JobState;

use crate::jobs::JobTable;
use crate::sio;

/// Handles for the running signal tasks. Dropping the driver aborts them;
/// `stop` does the same explicitly as the first step of teardown.
#[derive(Debug)]
pub(crate) struct SignalDriver {
    handles: Vec<JoinHandle<()>>,
}

impl SignalDriver {
    /// Install the signal streams and spawn their tasks. Must run inside a
    /// tokio runtime. Stream installation failure is a fatal setup error.
    pub(crate) fn spawn(table: &Arc<JobTable>) -> Result<Self> {
        let chld = signal(SignalKind::child()).context("failed to install SIGCHLD stream")?;
        let int = signal(SignalKind::interrupt()).context("failed to install SIGINT stream")?;
        let tstp = signal(SignalKind::from_raw(libc::SIGTSTP))
            .context("failed to install SIGTSTP stream")?;
        let quit = signal(SignalKind::quit()).context("failed to install SIGQUIT stream")?;

        let handles = vec![
            tokio::spawn(reap_loop(table.clone(), chld)),
            tokio::spawn(forward_loop(table.clone(), int, Signal::SIGINT)),
            tokio::spawn(forward_loop(table.clone(), tstp, Signal::SIGTSTP)),
            tokio::spawn(quit_loop(quit)),
        ];
        Ok(Self { handles })
    }

    /// Stop the tasks. Part one of the teardown ordering: no signal task
    /// may touch the table once teardown has begun.
    pub(crate) fn stop(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for SignalDriver {
    fn drop(&mut self) {
        self.abort_all();
    }
}

/// Stop the shell from being suspended by terminal I/O control signals when
/// a background job touches the terminal.
pub(crate) fn ignore_tty_signals() -> Result<()> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe {
        sigaction(Signal::SIGTTIN, &ignore).context("failed to ignore SIGTTIN")?;
        sigaction(Signal::SIGTTOU, &ignore).context("failed to ignore SIGTTOU")?;
    }
    Ok(())
}

/// Reset the job-control signals to their default dispositions. Runs after
/// the signal tasks are stopped and before the table is dropped.
pub(crate) fn restore_default_dispositions() {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for sig in [Signal::SIGINT, Signal::SIGTSTP, Signal::SIGCHLD] {
        if let Err(e) = unsafe { sigaction(sig, &default) } {
            tracing::warn!(%sig, error = %e, "failed to restore default disposition");
        }
    }
}

/// Reaper: on every child-status delivery, drain all pending changes.
async fn reap_loop(table: Arc<JobTable>, mut chld: tokio::signal::unix::Signal) {
    while chld.recv().await.is_some() {
        drain_child_statuses(&table).await;
    }
}

/// Drain every pending child status change, updating the table under the
/// lock, then wake the foreground waiter.
async fn drain_child_statuses(table: &JobTable) {
    let mut jobs = table.lock().await;
    loop {
        match waitpid(
            Pid::from_raw(-1),
            Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED),
        ) {
            Ok(WaitStatus::Exited(pid, status)) => {
                if let Some(id) = jobs.id_of(pid) {
                    tracing::debug!(%id, %pid, status, "child exited");
                    jobs.delete(id);
                }
            }
            Ok(WaitStatus::Signaled(pid, sig, _)) => {
                if let Some(id) = jobs.id_of(pid) {
                    sio::puts(&format!(
                        "Job [{}] ({}) terminated by signal {}\n",
                        id, pid, sig as i32
                    ));
                    jobs.delete(id);
                }
            }
            Ok(WaitStatus::Stopped(pid, sig)) => {
                if let Some(id) = jobs.id_of(pid) {
                    sio::puts(&format!(
                        "Job [{}] ({}) stopped by signal {}\n",
                        id, pid, sig as i32
                    ));
                    jobs.set_state(id, JobState::Stopped);
                }
            }
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Err(Errno::EINTR) => continue,
            Ok(other) => {
                tracing::debug!(?other, "unhandled wait status");
            }
            Err(e) => {
                tracing::warn!(error = %e, "waitpid failed");
                break;
            }
        }
    }
    drop(jobs);
    table.notify_change();
}

/// Interrupt forwarder: relay the received signal to the foreground job's
/// process group. No-op when there is no foreground job; background jobs
/// and the shell's own group are never targeted.
async fn forward_loop(
    table: Arc<JobTable>,
    mut stream: tokio::signal::unix::Signal,
    sig: Signal,
) {
    while stream.recv().await.is_some() {
        let jobs = table.lock().await;
        if let Some(id) = jobs.foreground() {
            if let Some(pid) = jobs.pid(id) {
                tracing::debug!(%id, %pid, %sig, "forwarding to foreground group");
                if let Err(e) = killpg(pid, sig) {
                    tracing::warn!(%pid, %sig, error = %e, "killpg failed");
                }
            }
        }
    }
}

/// SIGQUIT ends the shell immediately; cleanup is left to the OS.
async fn quit_loop(mut stream: tokio::signal::unix::Signal) {
    if stream.recv().await.is_some() {
        sio::puts("Terminating after receipt of SIGQUIT signal\n");
        std::process::exit(1);
    }
}
