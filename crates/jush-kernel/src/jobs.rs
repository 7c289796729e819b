//! Job table — the only piece of mutable state shared with the signal
//! tasks.
//!
//! `JobTable` pairs the storage (`JobMap`) with the two synchronization
//! primitives the whole shell runs on:
//!
//! - a single `tokio::sync::Mutex`, the analogue of the original's
//!   blocked-signal mask: the reaper drains child statuses entirely under
//!   it, so any read-then-act sequence that holds the guard cannot race a
//!   signal-driven mutation;
//! - a `tokio::sync::Notify`, the analogue of the atomic sigsuspend: the
//!   foreground waiter enables a `Notified` future before checking its
//!   condition, so a wakeup landing between check and await is never lost.
//!
//! The map is a growable `HashMap` keyed by job id. Ids are allocated as
//! the smallest positive integer not currently live, so they are reused
//! after deletion and never collide with a live job.

use std::collections::HashMap;
use std::io;

use nix::unistd::Pid;
use tokio::sync::futures::Notified;
use tokio::sync::{Mutex, MutexGuard, Notify};

use jush_types::{JobId, JobState};

/// One process group launched by the shell.
#[derive(Debug, Clone)]
pub struct Job {
    /// Table id, unique among live jobs.
    pub id: JobId,
    /// Leader process id; also the job's process group id.
    pub pid: Pid,
    /// Current state.
    pub state: JobState,
    /// The verbatim input line that launched it, newline stripped.
    pub cmdline: String,
}

/// Storage and lookup for live jobs. Access it through `JobTable::lock`.
#[derive(Debug, Default)]
pub struct JobMap {
    jobs: HashMap<JobId, Job>,
}

impl JobMap {
    /// Register a new job and return its id.
    ///
    /// Caller must hold the table lock from before the child was spawned,
    /// so the reaper cannot observe a child without a record.
    pub fn add(&mut self, pid: Pid, state: JobState, cmdline: &str) -> JobId {
        debug_assert!(
            state != JobState::Foreground || self.foreground().is_none(),
            "second foreground job"
        );
        let id = self.next_id();
        self.jobs.insert(
            id,
            Job {
                id,
                pid,
                state,
                cmdline: cmdline.to_string(),
            },
        );
        tracing::debug!(%id, %pid, cmdline, "added job");
        id
    }

    /// Remove a job. Returns false if no such job.
    pub fn delete(&mut self, id: JobId) -> bool {
        let removed = self.jobs.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "deleted job");
        }
        removed
    }

    /// Whether a job with this id is live.
    pub fn exists(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    /// Leader pid of a job.
    pub fn pid(&self, id: JobId) -> Option<Pid> {
        self.jobs.get(&id).map(|j| j.pid)
    }

    /// Id of the job owning this pid.
    pub fn id_of(&self, pid: Pid) -> Option<JobId> {
        self.jobs.values().find(|j| j.pid == pid).map(|j| j.id)
    }

    /// Current state of a job.
    pub fn state(&self, id: JobId) -> Option<JobState> {
        self.jobs.get(&id).map(|j| j.state)
    }

    /// Flip a job's state. Returns false if no such job.
    pub fn set_state(&mut self, id: JobId, state: JobState) -> bool {
        match self.jobs.get_mut(&id) {
            Some(job) => {
                tracing::debug!(%id, ?state, "job state change");
                job.state = state;
                true
            }
            None => false,
        }
    }

    /// The launching command line of a job.
    pub fn cmdline(&self, id: JobId) -> Option<&str> {
        self.jobs.get(&id).map(|j| j.cmdline.as_str())
    }

    /// The current foreground job, if any.
    pub fn foreground(&self) -> Option<JobId> {
        self.jobs
            .values()
            .find(|j| j.state == JobState::Foreground)
            .map(|j| j.id)
    }

    /// Write the `jobs` listing, ordered by id:
    /// `[id] (pid) State cmdline`.
    pub fn enumerate<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        let mut jobs: Vec<&Job> = self.jobs.values().collect();
        jobs.sort_by_key(|j| j.id);
        for job in jobs {
            writeln!(w, "[{}] ({}) {} {}", job.id, job.pid, job.state, job.cmdline)?;
        }
        Ok(())
    }

    /// Number of live jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Smallest positive id not currently live.
    fn next_id(&self) -> JobId {
        let mut id = 1;
        while self.jobs.contains_key(&JobId(id)) {
            id += 1;
        }
        JobId(id)
    }
}

/// The shared job table: storage behind one lock, plus the change
/// notification the reaper fires after every drain.
#[derive(Debug, Default)]
pub struct JobTable {
    inner: Mutex<JobMap>,
    changed: Notify,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the table lock. Holding the guard excludes the reaper and
    /// the interrupt forwarders for the duration.
    pub async fn lock(&self) -> MutexGuard<'_, JobMap> {
        self.inner.lock().await
    }

    /// A future resolving at the next change notification. Callers must
    /// `enable` it before checking the condition they wait on.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    /// Wake every waiter. Called by the reaper after a drain, after the
    /// lock is released.
    pub fn notify_change(&self) {
        self.changed.notify_waiters();
    }
}
