//! jush-kernel: the core of jush.
//!
//! This crate provides:
//!
//! - **Tokenizer**: splits a raw input line into an argument vector,
//!   redirection filenames, and a builtin classification
//! - **Job table**: the one piece of shared mutable state, guarded by a
//!   single lock plus a change notification
//! - **Signal tasks**: the reaper (child status) and the interrupt
//!   forwarders (Ctrl-C / Ctrl-Z), driven by OS signal streams
//! - **Dispatcher**: evaluates one line — builtins, redirections, process
//!   group launch, the blocking foreground wait
//! - **Kernel**: owns the table and the signal tasks, and tears both down
//!   in the right order on exit
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Kernel                              │
//! │                                                              │
//! │  read loop ──▶ eval ──▶ builtins (quit/jobs/bg/fg)           │
//! │                  │                                           │
//! │                  └──▶ spawn + register ──▶ foreground wait   │
//! │                              │                    ▲          │
//! │                        ┌─────┴──────┐             │ notify   │
//! │                        │  JobTable  │◀── reaper ──┘          │
//! │                        │ (one lock) │◀── SIGINT/SIGTSTP fwd  │
//! │                        └────────────┘                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table lock stands in for the original's blocked-signal mask: the
//! reaper drains child statuses entirely under it, so any code path that
//! holds it cannot race a signal-driven mutation. The foreground wait pairs
//! the lock with a notification enabled before the condition check, the
//! analogue of an atomic sigsuspend.

mod builtin;
mod dispatch;
mod signals;

pub mod jobs;
pub mod kernel;
pub mod parse;
pub mod sio;

pub use jobs::{Job, JobMap, JobTable};
pub use kernel::{EvalOutcome, Kernel};
pub use parse::{parse, Builtin, CommandLine};
