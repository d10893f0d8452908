//! Pixel adjustments. Every element here needs an input image.

use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, Rgba};

use crate::args::{ArgWriter, Args, Colour, Value};
use crate::engine::{require_image, Context, Element, ElementRef};
use crate::error::{DarkroomError, Result};
use crate::registry::Decodable;

use super::check_size;

/// `contrast(amount)`: positive increases contrast, negative decreases it.
#[derive(Debug, Clone)]
pub struct Contrast {
    amount: Value,
}

impl Contrast {
    pub const DECODABLE: Decodable = Decodable {
        name: "contrast",
        help: &[("contrast(amount)", "Adjusts contrast; negative values flatten")],
        decode: |args| {
            Ok(Arc::new(Contrast {
                amount: args.value()?,
            }))
        },
    };
}

impl Element for Contrast {
    fn name(&self) -> &str {
        "contrast"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let amount = self.amount.float(self.name(), Some(image))?;
        Ok(Some(image.adjust_contrast(amount as f32)))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.value(&self.amount);
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `brightness(amount)`: adds `amount` to every colour channel.
#[derive(Debug, Clone)]
pub struct Brightness {
    amount: Value,
}

impl Brightness {
    pub const DECODABLE: Decodable = Decodable {
        name: "brightness",
        help: &[("brightness(amount)", "Adds amount to every colour channel")],
        decode: |args| {
            Ok(Arc::new(Brightness {
                amount: args.value()?,
            }))
        },
    };
}

impl Element for Brightness {
    fn name(&self) -> &str {
        "brightness"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let amount = self.amount.float(self.name(), Some(image))?.round();
        Ok(Some(image.brighten(amount as i32)))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.value(&self.amount);
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `rotate(quarter_turns)`: clockwise; negative turns go counter-clockwise.
#[derive(Debug, Clone)]
pub struct Rotate {
    turns: i64,
}

impl Rotate {
    pub const DECODABLE: Decodable = Decodable {
        name: "rotate",
        help: &[("rotate(quarter_turns)", "Rotates clockwise in 90 degree steps")],
        decode: |args| Ok(Arc::new(Rotate { turns: args.int()? })),
    };

    pub fn turns(&self) -> i64 {
        self.turns
    }
}

impl Element for Rotate {
    fn name(&self) -> &str {
        "rotate"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let rotated = match self.turns.rem_euclid(4) {
            1 => image.rotate90(),
            2 => image.rotate180(),
            3 => image.rotate270(),
            _ => image.clone(),
        };
        Ok(Some(rotated))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.int(self.turns);
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `resize(width height)`: exact resize, aspect ratio not preserved.
#[derive(Debug, Clone)]
pub struct Resize {
    width: Value,
    height: Value,
}

impl Resize {
    pub const DECODABLE: Decodable = Decodable {
        name: "resize",
        help: &[(
            "resize(width height)",
            "Resizes to exactly width x height (Lanczos3); accepts `w / 2` style expressions",
        )],
        decode: |args| {
            Ok(Arc::new(Resize {
                width: args.value()?,
                height: args.value()?,
            }))
        },
    };
}

impl Element for Resize {
    fn name(&self) -> &str {
        "resize"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let width = self.width.pixels(self.name(), Some(image))?;
        let height = self.height.pixels(self.name(), Some(image))?;
        check_size(self.name(), width, height)?;
        Ok(Some(image.resize_exact(width, height, FilterType::Lanczos3)))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.value(&self.width);
        w.value(&self.height);
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `crop(x y width height)`, clamped to the image bounds.
#[derive(Debug, Clone)]
pub struct Crop {
    x: Value,
    y: Value,
    width: Value,
    height: Value,
}

impl Crop {
    pub const DECODABLE: Decodable = Decodable {
        name: "crop",
        help: &[("crop(x y width height)", "Crops to a rectangle, clamped to the image")],
        decode: |args| {
            Ok(Arc::new(Crop {
                x: args.value()?,
                y: args.value()?,
                width: args.value()?,
                height: args.value()?,
            }))
        },
    };
}

impl Element for Crop {
    fn name(&self) -> &str {
        "crop"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let name = self.name();
        let x = self.x.pixels(name, Some(image))?.min(image.width());
        let y = self.y.pixels(name, Some(image))?.min(image.height());
        let width = self.width.pixels(name, Some(image))?.min(image.width() - x);
        let height = self.height.pixels(name, Some(image))?.min(image.height() - y);
        if width == 0 || height == 0 {
            return Err(DarkroomError::element(
                name,
                format!(
                    "crop at {},{} leaves nothing of a {}x{} image",
                    x,
                    y,
                    image.width(),
                    image.height()
                ),
            ));
        }
        Ok(Some(image.crop_imm(x, y, width, height)))
    }

    fn encode(&self, w: &mut ArgWriter) {
        for value in [&self.x, &self.y, &self.width, &self.height] {
            w.value(value);
        }
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `blur(sigma)`: Gaussian blur.
#[derive(Debug, Clone)]
pub struct Blur {
    sigma: Value,
}

impl Blur {
    pub const DECODABLE: Decodable = Decodable {
        name: "blur",
        help: &[("blur(sigma)", "Gaussian blur with the given standard deviation")],
        decode: |args| {
            Ok(Arc::new(Blur {
                sigma: args.value()?,
            }))
        },
    };
}

impl Element for Blur {
    fn name(&self) -> &str {
        "blur"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let sigma = self.sigma.float(self.name(), Some(image))?;
        if sigma < 0.0 {
            return Err(DarkroomError::element(self.name(), "sigma must not be negative"));
        }
        if sigma == 0.0 {
            return Ok(Some(image.clone()));
        }
        let sigma = sigma as f32;
        if !sigma.is_normal() {
            return Err(DarkroomError::element(
                self.name(),
                format!("sigma '{}' is out of range", self.sigma.source()),
            ));
        }
        Ok(Some(image.blur(sigma)))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.value(&self.sigma);
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `grayscale()`
#[derive(Debug, Clone)]
pub struct Grayscale;

impl Grayscale {
    pub const DECODABLE: Decodable = Decodable {
        name: "grayscale",
        help: &[("grayscale()", "Converts to luma, keeping alpha")],
        decode: |_| Ok(Arc::new(Grayscale)),
    };
}

impl Element for Grayscale {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        Ok(Some(require_image(self.name(), image)?.grayscale()))
    }

    fn encode(&self, _w: &mut ArgWriter) {}
}

/// `invert()`
#[derive(Debug, Clone)]
pub struct Invert;

impl Invert {
    pub const DECODABLE: Decodable = Decodable {
        name: "invert",
        help: &[("invert()", "Inverts every colour channel")],
        decode: |_| Ok(Arc::new(Invert)),
    };
}

impl Element for Invert {
    fn name(&self) -> &str {
        "invert"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let mut out = require_image(self.name(), image)?.clone();
        out.invert();
        Ok(Some(out))
    }

    fn encode(&self, _w: &mut ArgWriter) {}
}

/// Apply `f` to every pixel as a [`Colour`], producing an RGBA image.
fn map_colours(image: &DynamicImage, f: impl Fn(Colour) -> Colour) -> DynamicImage {
    let mut out = image.to_rgba8();
    for pixel in out.pixels_mut() {
        *pixel = Rgba(f(Colour::from_rgba(pixel.0)).to_rgba());
    }
    DynamicImage::ImageRgba8(out)
}

/// `saturate(percent)`: shifts HSL saturation; -100 removes all colour.
#[derive(Debug, Clone)]
pub struct Saturate {
    percent: Value,
}

impl Saturate {
    pub const DECODABLE: Decodable = Decodable {
        name: "saturate",
        help: &[(
            "saturate(percent)",
            "Shifts saturation by percent of the remaining range (-100 to 100)",
        )],
        decode: |args| {
            Ok(Arc::new(Saturate {
                percent: args.value()?,
            }))
        },
    };
}

impl Element for Saturate {
    fn name(&self) -> &str {
        "saturate"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let percent = self.percent.float(self.name(), Some(image))? as f32;
        Ok(Some(map_colours(image, |c| c.saturate(percent))))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.value(&self.percent);
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `tint(colour amount=0.5)`: mixes every pixel toward `colour`.
#[derive(Debug, Clone)]
pub struct Tint {
    colour: Colour,
    amount: Value,
}

impl Tint {
    pub const DECODABLE: Decodable = Decodable {
        name: "tint",
        help: &[("tint(colour amount=0.5)", "Mixes every pixel toward a colour")],
        decode: decode_tint,
    };
}

fn decode_tint(args: &mut Args<'_, '_>) -> Result<ElementRef> {
    let colour = args.colour()?;
    let amount = args.value_or(Value::number(0.5))?;
    Ok(Arc::new(Tint { colour, amount }))
}

impl Element for Tint {
    fn name(&self) -> &str {
        "tint"
    }

    fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        let amount = self.amount.float(self.name(), Some(image))? as f32;
        let colour = self.colour;
        Ok(Some(map_colours(image, |c| c.mix(colour, amount))))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.colour(self.colour);
        w.value(&self.amount);
    }

    fn inline(&self) -> bool {
        true
    }
}
