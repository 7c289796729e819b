//! jush REPL — the interactive read-eval loop.
//!
//! The loop itself is synchronous: print the prompt, read one line, hand it
//! to the kernel with `block_on`. The kernel's signal tasks keep running on
//! the runtime's worker threads the whole time, including while the loop
//! sits blocked in `read_line`, so background jobs are reaped and reported
//! even when nothing is being evaluated.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use jush_kernel::{EvalOutcome, Kernel};

const PROMPT: &str = "jush> ";

/// Input lines longer than this are truncated before parsing.
const MAX_LINE: usize = 1024;

/// REPL configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Print the prompt before each read. Disabled by `-p`.
    pub emit_prompt: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self { emit_prompt: true }
    }
}

/// The read-eval loop: a kernel plus the runtime that drives it.
pub struct Repl {
    kernel: Kernel,
    runtime: Runtime,
    emit_prompt: bool,
}

impl Repl {
    /// Build the runtime and start the kernel inside it.
    pub fn new(config: ReplConfig) -> Result<Self> {
        let runtime = Runtime::new().context("failed to create tokio runtime")?;
        let kernel = {
            let _guard = runtime.enter();
            Kernel::start().context("failed to start kernel")?
        };
        Ok(Self {
            kernel,
            runtime,
            emit_prompt: config.emit_prompt,
        })
    }

    /// Run until end of input, `quit`, or a fatal read error.
    ///
    /// End of input prints a single newline and returns after a clean
    /// kernel shutdown; `quit` does the same without the newline. A read
    /// error propagates out and the process exits with status 1.
    pub fn run(self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut buf = String::new();

        loop {
            if self.emit_prompt {
                print!("{PROMPT}");
                stdout.flush().context("failed to flush prompt")?;
            }

            buf.clear();
            match stdin.lock().read_line(&mut buf) {
                Ok(0) => {
                    println!();
                    self.kernel.shutdown();
                    return Ok(());
                }
                Ok(_) => {
                    let line = clip_line(&buf);
                    match self.runtime.block_on(self.kernel.eval(line)) {
                        EvalOutcome::Continue => {}
                        EvalOutcome::Quit => {
                            self.kernel.shutdown();
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    return Err(e).context("read error on standard input");
                }
            }
        }
    }
}

/// Strip the trailing newline and cap the line at `MAX_LINE` bytes,
/// respecting character boundaries.
fn clip_line(buf: &str) -> &str {
    let mut line = buf.trim_end_matches('\n');
    if line.len() > MAX_LINE {
        let mut end = MAX_LINE;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        line = &line[..end];
    }
    line
}
