//! Per-command errors with their exact user-visible message formats.
//!
//! Every variant's `Display` is a message the shell prints verbatim before
//! aborting the current command and returning to the read loop. None of
//! these ever terminate the process.

use thiserror::Error;

/// An error in a single user command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    /// A redirection target or command path does not exist.
    #[error("{0}: No such file or directory")]
    NotFound(String),

    /// A redirection target or command path exists but cannot be opened or
    /// executed. Any open failure other than absence reports this, matching
    /// the original two-way split.
    #[error("{0}: Permission denied")]
    PermissionDenied(String),

    /// `bg`/`fg` invoked with no argument. The payload is the command name.
    #[error("{0} command requires PID or %jobid argument")]
    MissingJobRef(&'static str),

    /// `bg`/`fg` argument is not a positive decimal after stripping an
    /// optional leading `%`. The payload is the command name.
    #[error("{0}: argument must be a PID or %jobid")]
    MalformedJobRef(&'static str),

    /// The argument parsed but names neither a live job id nor a pid with a
    /// live job. The payload is the argument as the user typed it.
    #[error("{0}: No such job")]
    NoSuchJob(String),
}
