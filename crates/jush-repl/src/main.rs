//! jush CLI entry point.
//!
//! Usage:
//!   jush          # interactive shell
//!   jush -v       # verbose diagnostics
//!   jush -p       # no prompt (driver/pipe mode)

use std::env;
use std::io;
use std::os::unix::io::AsRawFd;
use std::process::ExitCode;

use anyhow::{Context, Result};
use nix::unistd;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jush_repl::{Repl, ReplConfig};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let mut emit_prompt = true;
    let mut verbose = false;

    for arg in env::args().skip(1) {
        if !arg.starts_with('-') {
            return Ok(print_usage());
        }
        for c in arg.chars().skip(1) {
            match c {
                'h' => return Ok(print_usage()),
                'v' => verbose = true,
                'p' => emit_prompt = false,
                _ => return Ok(print_usage()),
            }
        }
    }

    // Redirect stderr onto stdout so a single downstream consumer observes
    // all output in order. Everything after this, including tracing, lands
    // on the same stream.
    unistd::dup2(io::stdout().as_raw_fd(), io::stderr().as_raw_fd()).context("dup2 error")?;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    // Injected before any job launches; inherited by every child.
    env::set_var("MY_ENV", "42");
    tracing::debug!(verbose, emit_prompt, "starting jush");

    Repl::new(ReplConfig { emit_prompt })?.run()?;
    Ok(ExitCode::SUCCESS)
}

fn print_usage() -> ExitCode {
    println!("Usage: jush [-hvp]");
    println!("   -h   print this message");
    println!("   -v   print additional diagnostic information");
    println!("   -p   do not emit a command prompt");
    ExitCode::FAILURE
}
