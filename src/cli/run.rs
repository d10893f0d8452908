//! Run command implementation.
//!
//! Decodes a script and runs one of its pipelines once, in script mode.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;

use crate::config::Config;
use crate::decode::decode;
use crate::elements::{builtin_registry, write_image};
use crate::engine::Mode;
use crate::error::{DarkroomError, Result};
use crate::output::{display_path, elapsed, Printer};
use crate::script::Vars;

/// Run a script once
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Script file
    pub script: PathBuf,

    /// Image fed to the pipeline (otherwise it starts empty)
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Where to write the final image
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Named pipeline to run, e.g. .main (default: the first anonymous one)
    #[arg(long, short)]
    pub pipeline: Option<String>,
}

pub fn run(args: RunArgs, config: &Config, vars: &Vars, printer: &Printer) -> Result<()> {
    let registry = builtin_registry(config)?;
    let source = super::read_script(&args.script)?;
    let root = decode(&source, vars, &registry)?;

    let input = match &args.input {
        Some(path) => Some(image::open(path).map_err(|e| DarkroomError::Io {
            path: path.clone(),
            message: format!("Failed to read image: {}", e),
        })?),
        None => None,
    };

    let label = args.pipeline.as_deref().unwrap_or("main pipeline");
    printer.status("Running", &format!("{} from {}", label, display_path(&args.script)));

    let started = Instant::now();
    let mut ctx = registry.context(Mode::Script).with_verbose(config.verbose);
    let output = match root.run(args.pipeline.as_deref(), &mut ctx, input.as_ref()) {
        Ok(output) => output,
        Err(halted) => {
            if let (Some(partial), Some(path)) = (&halted.partial, &args.output) {
                write_image(partial, path)?;
                printer.warning("Partial", &format!("image written to {}", display_path(path)));
            }
            return Err(halted.into());
        }
    };

    match (&output, &args.output) {
        (Some(image), Some(path)) => {
            write_image(image, path)?;
            printer.status("Wrote", &format!(
                "{} ({}x{}) in {}",
                display_path(path),
                image.width(),
                image.height(),
                elapsed(started.elapsed())
            ));
        }
        (None, Some(_)) => {
            printer.warning("Skipped", "pipeline produced no image; nothing written");
        }
        _ => printer.status("Finished", &format!("in {}", elapsed(started.elapsed()))),
    }

    Ok(())
}
