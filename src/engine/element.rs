//! The executable unit every plugin implements.

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;

use crate::args::ArgWriter;
use crate::error::{DarkroomError, Result};

use super::context::Context;

/// A decoded, executable operation.
///
/// `apply` takes the current image (if any) and returns the next one.
/// Elements that transform an image fail with
/// [`DarkroomError::NeedsImage`] when given `None`; elements that load or
/// synthesize an image accept `None`.
pub trait Element: fmt::Debug + Send + Sync {
    /// The registry name the encoder writes as the head of this element.
    fn name(&self) -> &str;

    fn apply(&self, ctx: &mut Context, image: Option<&DynamicImage>)
        -> Result<Option<DynamicImage>>;

    /// Write this element's arguments, in decode order.
    fn encode(&self, w: &mut ArgWriter);

    /// Prefer `name(a b c)` on one line over one argument per line.
    fn inline(&self) -> bool {
        false
    }
}

/// Elements are shared: a named pipeline is held by its definition and by
/// every reference to it.
pub type ElementRef = Arc<dyn Element>;

/// Borrow the input image or fail with the distinguished "needs image" error.
pub fn require_image<'a>(element: &str, image: Option<&'a DynamicImage>) -> Result<&'a DynamicImage> {
    image.ok_or_else(|| DarkroomError::NeedsImage {
        element: element.to_string(),
    })
}
