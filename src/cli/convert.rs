//! Convert command implementation.
//!
//! Runs one decoded script over every image under a directory. The script
//! is decoded once and each image gets a fresh Context. State slots start
//! empty per image; the registry's cache container is shared, so `once`
//! results computed for the first image are reused for the rest.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use walkdir::WalkDir;

use crate::config::Config;
use crate::decode::{decode, Root};
use crate::elements::{builtin_registry, write_image};
use crate::engine::Mode;
use crate::error::{DarkroomError, Result};
use crate::output::{display_path, elapsed, plural, Printer};
use crate::registry::Registry;
use crate::script::Vars;

/// Run a script over every image in a directory
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Script file
    pub script: PathBuf,

    /// Directory of input images (searched recursively)
    pub dir: PathBuf,

    /// Output directory (default: `output` from darkroom.yaml, else dist)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Named pipeline to run (default: the first anonymous one)
    #[arg(long, short)]
    pub pipeline: Option<String>,
}

pub fn run(args: ConvertArgs, config: &Config, vars: &Vars, printer: &Printer) -> Result<()> {
    let registry = builtin_registry(config)?;
    let source = super::read_script(&args.script)?;
    let root = decode(&source, vars, &registry)?;
    let output_dir = args.output.clone().unwrap_or_else(|| config.output.clone());

    let inputs = collect_images(&args.dir, config)?;
    printer.status(
        "Converting",
        &format!("{} from {}", plural(inputs.len(), "image", "images"), display_path(&args.dir)),
    );

    let started = Instant::now();
    let mut failed = 0;
    for input in &inputs {
        let relative = input.strip_prefix(&args.dir).unwrap_or(input);
        let target = output_dir.join(relative);
        match convert_one(&root, &registry, config, args.pipeline.as_deref(), input, &target) {
            Ok(true) => printer.info("Converted", &display_path(&target)),
            Ok(false) => printer.warning("Skipped", &format!("{} (no image produced)", display_path(input))),
            Err(e) => {
                failed += 1;
                printer.error("Failed", &format!("{}: {}", display_path(input), e));
            }
        }
    }

    if failed > 0 {
        return Err(DarkroomError::element(
            "convert",
            format!("{} failed", plural(failed, "image", "images")),
        ));
    }

    printer.status(
        "Finished",
        &format!(
            "{} to {} in {}",
            plural(inputs.len(), "image", "images"),
            display_path(&output_dir),
            elapsed(started.elapsed())
        ),
    );
    Ok(())
}

/// Image files under `dir` with a configured extension, sorted.
pub fn collect_images(dir: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| DarkroomError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
            message: e.to_string(),
        })?;
        if entry.file_type().is_file() && config.is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();
    Ok(images)
}

/// Returns whether an image was written.
fn convert_one(
    root: &Root,
    registry: &Registry,
    config: &Config,
    pipeline: Option<&str>,
    input: &Path,
    target: &Path,
) -> Result<bool> {
    let image = image::open(input).map_err(|e| DarkroomError::Io {
        path: input.to_path_buf(),
        message: format!("Failed to read image: {}", e),
    })?;

    let mut ctx = registry.context(Mode::Convert).with_verbose(config.verbose);
    match root.run(pipeline, &mut ctx, Some(&image))? {
        Some(output) => {
            write_image(&output, target)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_collect_images_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        let blank = DynamicImage::ImageRgba8(RgbaImage::new(1, 1));
        blank.save(dir.join("b.png")).unwrap();
        blank.save(dir.join("sub/a.png")).unwrap();
        std::fs::write(dir.join("notes.txt"), "not an image").unwrap();

        let images = collect_images(dir, &Config::default()).unwrap();

        assert_eq!(images, vec![dir.join("b.png"), dir.join("sub/a.png")]);
    }
}
