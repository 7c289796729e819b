//! Job identification and state types.

/// Unique identifier for a job tracked by the shell.
///
/// Small positive integer, unique among live jobs. Ids are reused after a
/// job is deleted; the table allocates the smallest free one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u32);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a job.
///
/// A job with no record does not exist; there is no fourth state value.
/// At most one job is `Foreground` at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// The single job the shell is currently blocked waiting on.
    Foreground,
    /// Running without the shell waiting on it.
    Background,
    /// Stopped by a signal (e.g. Ctrl-Z / SIGTSTP); record retained.
    Stopped,
}

impl std::fmt::Display for JobState {
    /// Listing strings used by `jobs`: background jobs show as `Running`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Foreground => write!(f, "Foreground"),
            JobState::Background => write!(f, "Running"),
            JobState::Stopped => write!(f, "Stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_displays_bare_number() {
        assert_eq!(JobId(7).to_string(), "7");
    }

    #[test]
    fn listing_strings() {
        assert_eq!(JobState::Foreground.to_string(), "Foreground");
        assert_eq!(JobState::Background.to_string(), "Running");
        assert_eq!(JobState::Stopped.to_string(), "Stopped");
    }
}
