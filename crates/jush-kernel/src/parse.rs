//! Tokenizer — splits a raw input line into argv, redirections, and a
//! builtin classification.
//!
//! Grammar is deliberately small: whitespace-separated words, single quotes
//! grouping a word with spaces, `<` and `>` introducing redirection
//! filenames, and a trailing `&` marking a background job. Empty and
//! malformed lines (unterminated quote, redirect without a filename) parse
//! to `None` and are silently dropped by the dispatcher.

/// Which builtin a command line names, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Not a builtin: launch as an external process.
    None,
    /// `quit`
    Quit,
    /// `jobs`
    Jobs,
    /// `bg <pid|%jobid>`
    Bg,
    /// `fg <pid|%jobid>`
    Fg,
}

/// A tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Argument vector; first entry is the command name. Never empty.
    pub argv: Vec<String>,
    /// Input redirection filename, from `< file`.
    pub infile: Option<String>,
    /// Output redirection filename, from `> file`.
    pub outfile: Option<String>,
    /// Builtin classification of `argv[0]`.
    pub builtin: Builtin,
    /// True when the line ended with `&`.
    pub background: bool,
}

/// Tokenize one input line. Returns `None` for empty or malformed input.
pub fn parse(line: &str) -> Option<CommandLine> {
    let mut words = split_words(line)?;

    // A trailing `&` (standalone token, or glued to the last word) marks a
    // background job.
    let mut background = false;
    if let Some(last) = words.last().cloned() {
        if last == "&" {
            background = true;
            words.pop();
        } else if let Some(stripped) = last.strip_suffix('&') {
            background = true;
            let idx = words.len() - 1;
            words[idx] = stripped.to_string();
        }
    }

    // Pull out `< file` / `> file` pairs; a redirect token with no
    // following filename is malformed.
    let mut argv = Vec::new();
    let mut infile = None;
    let mut outfile = None;
    let mut iter = words.into_iter();
    while let Some(word) = iter.next() {
        match word.as_str() {
            "<" => infile = Some(iter.next()?),
            ">" => outfile = Some(iter.next()?),
            _ => argv.push(word),
        }
    }

    if argv.is_empty() {
        return None;
    }

    let builtin = match argv[0].as_str() {
        "quit" => Builtin::Quit,
        "jobs" => Builtin::Jobs,
        "bg" => Builtin::Bg,
        "fg" => Builtin::Fg,
        _ => Builtin::None,
    };

    Some(CommandLine {
        argv,
        infile,
        outfile,
        builtin,
        background,
    })
}

/// Split on whitespace, grouping single-quoted spans. `None` on an
/// unterminated quote.
fn split_words(line: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '\'' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    if !current.is_empty() {
        words.push(current);
    }
    Some(words)
}
