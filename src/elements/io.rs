//! Elements that bring images in and write them out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};

use crate::args::{ArgWriter, Colour, Value};
use crate::engine::{require_image, Context, Element};
use crate::error::{DarkroomError, Result};
use crate::registry::Decodable;

use super::check_size;

/// `load(path)`: reads an image file, ignoring the input image.
#[derive(Debug, Clone)]
pub struct Load {
    path: PathBuf,
}

impl Load {
    pub const DECODABLE: Decodable = Decodable {
        name: "load",
        help: &[("load(path)", "Reads an image file (PNG, JPEG, ...)")],
        decode: |args| Ok(Arc::new(Load::new(args.string()?))),
    };

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Element for Load {
    fn name(&self) -> &str {
        "load"
    }

    fn apply(&self, _ctx: &mut Context, _image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = image::open(&self.path).map_err(|e| DarkroomError::Io {
            path: self.path.clone(),
            message: format!("Failed to read image: {}", e),
        })?;
        tracing::trace!(path = %self.path.display(), width = image.width(), height = image.height(), "loaded image");
        Ok(Some(image))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.string(&self.path.to_string_lossy());
    }

    fn inline(&self) -> bool {
        true
    }
}

/// Write `image` to `path`, creating parent directories. The format
/// follows the extension.
pub fn write_image(image: &DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DarkroomError::Io {
            path: parent.to_path_buf(),
            message: format!("Failed to create directory: {}", e),
        })?;
    }
    image.save(path).map_err(|e| DarkroomError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write image: {}", e),
    })
}

/// `save(path)`: writes the current image and passes it through.
#[derive(Debug, Clone)]
pub struct Save {
    path: PathBuf,
}

impl Save {
    pub const DECODABLE: Decodable = Decodable {
        name: "save",
        help: &[("save(path)", "Writes the image; the format follows the extension")],
        decode: |args| Ok(Arc::new(Save::new(args.string()?))),
    };

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Element for Save {
    fn name(&self) -> &str {
        "save"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        write_image(image, &self.path)?;
        Ok(Some(image.clone()))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.string(&self.path.to_string_lossy());
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `canvas(width height colour="#00000000")`: a solid RGBA image.
///
/// Sizes may be expressions over the input image (`` `w` ``); plain
/// numbers need no input.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: Value,
    height: Value,
    colour: Colour,
}

impl Canvas {
    pub const DECODABLE: Decodable = Decodable {
        name: "canvas",
        help: &[(
            "canvas(width height colour=#00000000)",
            "Creates a solid image, transparent by default",
        )],
        decode: |args| {
            Ok(Arc::new(Canvas {
                width: args.value()?,
                height: args.value()?,
                colour: args.colour_or(Colour::TRANSPARENT)?,
            }))
        },
    };
}

impl Element for Canvas {
    fn name(&self) -> &str {
        "canvas"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let width = self.width.pixels(self.name(), image)?;
        let height = self.height.pixels(self.name(), image)?;
        check_size(self.name(), width, height)?;
        let canvas = RgbaImage::from_pixel(width, height, Rgba(self.colour.to_rgba()));
        Ok(Some(DynamicImage::ImageRgba8(canvas)))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.value(&self.width);
        w.value(&self.height);
        w.colour(self.colour);
    }

    fn inline(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Mode;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context::new(Mode::Script, &[])
    }

    fn canvas(width: &str, height: &str, colour: Colour) -> Canvas {
        Canvas {
            width: Value::parse(width).unwrap(),
            height: Value::parse(height).unwrap(),
            colour,
        }
    }

    #[test]
    fn test_canvas_without_input() {
        let out = canvas("3", "2", Colour::rgb(255, 0, 0))
            .apply(&mut ctx(), None)
            .unwrap()
            .unwrap();
        assert_eq!((out.width(), out.height()), (3, 2));
        assert_eq!(out.to_rgba8().get_pixel(2, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_canvas_expression_needs_image() {
        let err = canvas("`w`", "2", Colour::TRANSPARENT)
            .apply(&mut ctx(), None)
            .unwrap_err();
        assert!(err.is_needs_image());
    }

    #[test]
    fn test_canvas_size_is_bounded() {
        let err = canvas("4294967295", "4294967295", Colour::TRANSPARENT)
            .apply(&mut ctx(), None)
            .unwrap_err();
        assert!(err.to_string().contains("image limit"), "{}", err);

        let err = canvas("0", "2", Colour::TRANSPARENT)
            .apply(&mut ctx(), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "canvas: 0x2 is an empty image");
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/out.png");
        let image = canvas("4", "4", Colour::rgb(0, 128, 255))
            .apply(&mut ctx(), None)
            .unwrap()
            .unwrap();

        let passed = Save::new(&path).apply(&mut ctx(), Some(&image)).unwrap();
        assert_eq!(passed.as_ref(), Some(&image));
        assert!(path.exists());

        let loaded = Load::new(&path).apply(&mut ctx(), None).unwrap().unwrap();
        assert_eq!(loaded.to_rgba8(), image.to_rgba8());
    }

    #[test]
    fn test_save_needs_image() {
        let temp = TempDir::new().unwrap();
        let err = Save::new(temp.path().join("x.png"))
            .apply(&mut ctx(), None)
            .unwrap_err();
        assert!(err.is_needs_image());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Load::new("/nonexistent/photo.png")
            .apply(&mut ctx(), None)
            .unwrap_err();
        assert!(matches!(err, DarkroomError::Io { .. }));
    }
}
