//! Composition and control elements: grouping, mode gating and state slots.

use std::collections::HashMap;
use std::sync::Arc;

use image::DynamicImage;

use crate::args::{ArgWriter, Args};
use crate::engine::{require_image, Context, Element, ElementRef, Mode, Pipeline};
use crate::error::{DarkroomError, Result};
use crate::registry::Decodable;
use crate::script::ANONYMOUS_HEAD;

/// `pipeline(element...)`, also written `( ... )`.
pub const PIPELINE: Decodable = Decodable {
    name: ANONYMOUS_HEAD,
    help: &[
        ("pipeline(element...)", "Runs its elements in order"),
        ("(element...)", "Shorthand for pipeline(...)"),
    ],
    decode: |args| Ok(Pipeline::new(args.elements()?).into_ref()),
};

/// `only(mode element...)`: runs its elements in one mode, passes the
/// image through in every other.
#[derive(Debug)]
pub struct Only {
    mode: Mode,
    inner: Pipeline,
}

impl Only {
    pub const DECODABLE: Decodable = Decodable {
        name: "only",
        help: &[(
            "only(mode element...)",
            "Runs its elements only in convert, script or edit mode",
        )],
        decode: decode_only,
    };
}

fn decode_only(args: &mut Args<'_, '_>) -> Result<ElementRef> {
    let mode = args.string()?;
    let mode = mode.parse::<Mode>().map_err(|e| args.reject(e))?;
    let inner = Pipeline::new(args.elements()?);
    Ok(Arc::new(Only { mode, inner }))
}

impl Element for Only {
    fn name(&self) -> &str {
        "only"
    }

    fn apply(&self, ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        if ctx.mode() != self.mode {
            return Ok(image.cloned());
        }
        Ok(self.inner.run(ctx, image)?)
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.string(self.mode.name());
        for element in self.inner.elements() {
            w.element(element.as_ref());
        }
    }
}

/// Images saved by `stash`, owned by one Context.
#[derive(Debug, Default)]
pub struct StateSlots {
    slots: HashMap<String, DynamicImage>,
}

impl StateSlots {
    /// Extension-store key.
    pub const EXTENSION_KEY: &'static str = "state";

    pub fn get(&self, slot: &str) -> Option<&DynamicImage> {
        self.slots.get(slot)
    }

    pub fn set(&mut self, slot: impl Into<String>, image: DynamicImage) {
        self.slots.insert(slot.into(), image);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// `stash(slot)`: keeps a copy of the current image, passes it through.
#[derive(Debug, Clone)]
pub struct Stash {
    slot: String,
}

impl Stash {
    pub const DECODABLE: Decodable = Decodable {
        name: "stash",
        help: &[("stash(slot)", "Saves a copy of the image for recall(slot)")],
        decode: |args| Ok(Arc::new(Stash { slot: args.string()? })),
    };
}

impl Element for Stash {
    fn name(&self) -> &str {
        "stash"
    }

    fn apply(&self, ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        let image = require_image(self.name(), image)?;
        ctx.extensions_mut()
            .get_or_insert_with(StateSlots::EXTENSION_KEY, StateSlots::default)
            .set(self.slot.as_str(), image.clone());
        Ok(Some(image.clone()))
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.string(&self.slot);
    }

    fn inline(&self) -> bool {
        true
    }
}

/// `recall(slot)`: replaces the current image with a stashed copy.
#[derive(Debug, Clone)]
pub struct Recall {
    slot: String,
}

impl Recall {
    pub const DECODABLE: Decodable = Decodable {
        name: "recall",
        help: &[("recall(slot)", "Replaces the image with the one saved by stash(slot)")],
        decode: |args| Ok(Arc::new(Recall { slot: args.string()? })),
    };
}

impl Element for Recall {
    fn name(&self) -> &str {
        "recall"
    }

    fn apply(&self, ctx: &mut Context, _image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        ctx.extensions()
            .get::<StateSlots>(StateSlots::EXTENSION_KEY)
            .and_then(|slots| slots.get(&self.slot))
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                DarkroomError::element(self.name(), format!("nothing stashed in '{}'", self.slot))
            })
    }

    fn encode(&self, w: &mut ArgWriter) {
        w.string(&self.slot);
    }

    fn inline(&self) -> bool {
        true
    }
}
