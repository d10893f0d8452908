//! Sequential composition of elements.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use thiserror::Error;

use crate::args::ArgWriter;
use crate::error::{DarkroomError, Result};
use crate::script::ANONYMOUS_HEAD;

use super::context::Context;
use super::element::{Element, ElementRef};

/// A run stopped early: the first error plus the image as of the failing step.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct Halted {
    pub error: DarkroomError,
    pub partial: Option<DynamicImage>,
}

impl From<Halted> for DarkroomError {
    fn from(halted: Halted) -> Self {
        halted.error
    }
}

/// An ordered, optionally named list of elements applied one after another.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    name: Option<String>,
    elements: Vec<ElementRef>,
}

impl Pipeline {
    pub fn new(elements: Vec<ElementRef>) -> Self {
        Self {
            name: None,
            elements,
        }
    }

    /// A pipeline defined under a name (sigil included, e.g. `.main`).
    pub fn named(name: impl Into<String>, elements: Vec<ElementRef>) -> Self {
        Self {
            name: Some(name.into()),
            elements,
        }
    }

    pub fn pipeline_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn elements(&self) -> &[ElementRef] {
        &self.elements
    }

    pub fn push(&mut self, element: ElementRef) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_ref(self) -> ElementRef {
        Arc::new(self)
    }

    /// Feed `image` through every element in order.
    ///
    /// Cancellation is checked before each element; the first error stops
    /// the run and is returned with the image produced so far.
    pub fn run(
        &self,
        ctx: &mut Context,
        image: Option<&DynamicImage>,
    ) -> std::result::Result<Option<DynamicImage>, Halted> {
        if let Some(name) = &self.name {
            ctx.enter_pipeline(name);
        }
        let result = self.run_steps(ctx, image);
        if self.name.is_some() {
            ctx.leave_pipeline();
        }
        result
    }

    fn run_steps(
        &self,
        ctx: &mut Context,
        image: Option<&DynamicImage>,
    ) -> std::result::Result<Option<DynamicImage>, Halted> {
        let mut current: Option<Cow<'_, DynamicImage>> = image.map(Cow::Borrowed);

        for element in &self.elements {
            if let Err(error) = ctx.check_cancelled() {
                return Err(Halted {
                    error,
                    partial: current.map(Cow::into_owned),
                });
            }

            let started = ctx.is_verbose().then(Instant::now);
            let outcome = element.apply(ctx, current.as_deref());
            if let Some(started) = started {
                tracing::debug!(
                    element = element.name(),
                    pipeline = ctx.current_pipeline().unwrap_or("-"),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    ok = outcome.is_ok(),
                    "step finished"
                );
            }

            match outcome {
                Ok(next) => current = next.map(Cow::Owned),
                Err(error) => {
                    return Err(Halted {
                        error,
                        partial: current.map(Cow::into_owned),
                    })
                }
            }
        }

        Ok(current.map(Cow::into_owned))
    }
}

impl Element for Pipeline {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS_HEAD)
    }

    fn apply(&self, ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        Ok(self.run(ctx, image)?)
    }

    fn encode(&self, w: &mut ArgWriter) {
        for element in &self.elements {
            w.element(element.as_ref());
        }
    }
}

/// A use of an earlier named pipeline: `.name()`.
///
/// Runs the shared definition; encodes as the bare reference rather than a
/// second copy of the definition.
#[derive(Debug, Clone)]
pub struct Reference {
    target: Arc<Pipeline>,
}

impl Reference {
    pub fn new(target: Arc<Pipeline>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &Arc<Pipeline> {
        &self.target
    }
}

impl Element for Reference {
    fn name(&self) -> &str {
        self.target.name()
    }

    fn apply(&self, ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
        self.target.apply(ctx, image)
    }

    fn encode(&self, _w: &mut ArgWriter) {}

    fn inline(&self) -> bool {
        true
    }
}
