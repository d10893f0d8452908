//! Terminal output for the darkroom CLI.
//!
//! Cargo-style status lines with right-aligned coloured verbs, written to
//! stderr. Stdout carries only command results (`fmt` text, `list --json`).

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// Width of the right-aligned verb column.
const VERB_WIDTH: usize = 12;

/// Verb colour, by how the step went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Done,
    Note,
    Warn,
    Fail,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Done => "\x1b[1;32m",
            Tone::Note => "\x1b[1;36m",
            Tone::Warn => "\x1b[1;33m",
            Tone::Fail => "\x1b[1;31m",
        }
    }
}

/// Status printer for command progress; colour is on when stderr is a terminal.
pub struct Printer {
    color: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }

    /// A finished step: "     Wrote out.png".
    pub fn status(&self, verb: &str, message: &str) {
        self.line(Tone::Done, verb, message);
    }

    /// Per-item progress and listing rows.
    pub fn info(&self, verb: &str, message: &str) {
        self.line(Tone::Note, verb, message);
    }

    pub fn warning(&self, verb: &str, message: &str) {
        self.line(Tone::Warn, verb, message);
    }

    pub fn error(&self, verb: &str, message: &str) {
        self.line(Tone::Fail, verb, message);
    }

    /// Secondary text such as element help.
    pub fn dim(&self, text: &str) -> String {
        if self.color {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn format_line(&self, tone: Tone, verb: &str, message: &str) -> String {
        if self.color {
            format!("{}{verb:>VERB_WIDTH$}{RESET} {message}", tone.ansi())
        } else {
            format!("{verb:>VERB_WIDTH$} {message}")
        }
    }

    fn line(&self, tone: Tone, verb: &str, message: &str) {
        let text = self.format_line(tone, verb, message);
        let _ = writeln!(io::stderr().lock(), "{text}");
    }
}

/// `plural(1, "image", "images")` gives "1 image".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, pluralized)
    }
}

/// Relative to the working directory when possible, absolute otherwise.
pub fn display_path(path: &Path) -> String {
    if let Ok(cwd) = std::env::current_dir() {
        if let Ok(relative) = path.strip_prefix(&cwd) {
            let s = relative.display().to_string();
            if s.is_empty() {
                return ".".to_string();
            }
            return s;
        }
    }
    path.display().to_string()
}

/// Short human duration: "840ms", "2.31s".
pub fn elapsed(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
