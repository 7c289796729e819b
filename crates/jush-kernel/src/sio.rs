//! Raw-fd console output.
//!
//! Notifications from the signal tasks and per-command error reports go
//! straight to the stdout file descriptor, bypassing the line buffer the
//! prompt path writes through. In the original this was the
//! async-signal-safe `sio_printf`; here the reentrancy constraint is gone
//! (the callers are ordinary tasks) but the dedicated primitive keeps a
//! whole message in one write so it cannot interleave with a half-flushed
//! prompt.

use std::io;

use nix::errno::Errno;
use nix::unistd;

/// Write a string to the stdout fd, retrying on EINTR and short writes.
/// Output errors are ignored; there is nowhere left to report them.
pub fn puts(s: &str) {
    let mut buf = s.as_bytes();
    while !buf.is_empty() {
        match unistd::write(io::stdout(), buf) {
            Ok(0) => break,
            Ok(n) => buf = &buf[n..],
            Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
}
