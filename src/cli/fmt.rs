//! Fmt command implementation.
//!
//! Decodes a script and prints its canonical encoding. Comments and
//! `${var}` references do not survive; the output runs the same steps.
//! `--write` therefore refuses scripts that have either.

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::decode::decode;
use crate::elements::builtin_registry;
use crate::encode::encode;
use crate::error::{DarkroomError, Result};
use crate::output::{display_path, Printer};
use crate::script::Vars;

/// Print a script in canonical form
#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Script file
    pub script: PathBuf,

    /// Rewrite the file instead of printing to stdout (scripts without
    /// comments or ${var} references only)
    #[arg(long)]
    pub write: bool,
}

pub fn run(args: FmtArgs, config: &Config, vars: &Vars, printer: &Printer) -> Result<()> {
    let registry = builtin_registry(config)?;
    let source = super::read_script(&args.script)?;
    let root = decode(&source, vars, &registry)?;
    let formatted = encode(&root);

    if !args.write {
        print!("{}", formatted);
        return Ok(());
    }

    if let Some(lost) = lost_on_rewrite(&source) {
        return Err(DarkroomError::element(
            "fmt",
            format!(
                "refusing to rewrite {}: it has {} the canonical form drops; run without --write",
                display_path(&args.script),
                lost
            ),
        ));
    }

    if formatted == source {
        printer.info("Unchanged", &display_path(&args.script));
        return Ok(());
    }
    std::fs::write(&args.script, &formatted).map_err(|e| DarkroomError::Io {
        path: args.script.clone(),
        message: format!("Failed to write script: {}", e),
    })?;
    printer.status("Formatted", &display_path(&args.script));
    Ok(())
}

/// What rewriting `source` in canonical form would throw away, if anything.
fn lost_on_rewrite(source: &str) -> Option<&'static str> {
    if source.lines().any(|line| line.trim_start().starts_with("//")) {
        Some("comments")
    } else if source.contains("${") {
        Some("${var} references")
    } else {
        None
    }
}
