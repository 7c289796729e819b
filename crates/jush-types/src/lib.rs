//! Pure data types for jush — job identity, job state, user-facing errors.
//!
//! This crate is a leaf dependency with no async runtime and no I/O. It
//! exists so the kernel and the REPL binary share the job vocabulary and the
//! exact user-visible error strings without pulling in the kernel's deps.

pub mod error;
pub mod job;

// Flat re-exports for convenience
pub use error::*;
pub use job::*;
