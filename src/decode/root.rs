//! The decode result: top-level pipelines in source order.

use std::sync::Arc;

use image::DynamicImage;

use crate::engine::{Context, ElementRef, Halted, Pipeline};
use crate::error::DarkroomError;

/// One top-level pipeline and the name it is looked up by.
///
/// Named definitions keep their sigil (`.main`); anonymous runs of
/// top-level entries get a synthetic `#n` name, numbered from 1.
#[derive(Debug, Clone)]
pub struct NamedElement {
    pub name: String,
    pub pipeline: Arc<Pipeline>,
}

impl NamedElement {
    pub fn is_anonymous(&self) -> bool {
        self.pipeline.pipeline_name().is_none()
    }

    pub fn element(&self) -> ElementRef {
        Arc::clone(&self.pipeline) as ElementRef
    }
}

/// Everything a script decoded to.
#[derive(Debug, Clone, Default)]
pub struct Root {
    entries: Vec<NamedElement>,
    anonymous: usize,
}

impl Root {
    pub(crate) fn push_definition(&mut self, pipeline: Arc<Pipeline>) {
        let name = pipeline.pipeline_name().unwrap_or_default().to_string();
        self.entries.push(NamedElement { name, pipeline });
    }

    pub(crate) fn push_anonymous(&mut self, pipeline: Pipeline) {
        self.anonymous += 1;
        self.entries.push(NamedElement {
            name: format!("#{}", self.anonymous),
            pipeline: Arc::new(pipeline),
        });
    }

    pub fn entries(&self) -> &[NamedElement] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Pipeline>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.pipeline)
    }

    /// The pipeline run when none is named: the first anonymous one, or
    /// failing that the last definition.
    pub fn main(&self) -> Option<&Arc<Pipeline>> {
        self.entries
            .iter()
            .find(|e| e.is_anonymous())
            .or_else(|| self.entries.last())
            .map(|e| &e.pipeline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `name` (or [`Root::main`]) against `image`.
    pub fn run(
        &self,
        name: Option<&str>,
        ctx: &mut Context,
        image: Option<&DynamicImage>,
    ) -> Result<Option<DynamicImage>, Halted> {
        let pipeline = match name {
            Some(name) => self.get(name).ok_or_else(|| Halted {
                error: DarkroomError::UndefinedPipeline {
                    name: name.to_string(),
                },
                partial: None,
            })?,
            None => match self.main() {
                Some(pipeline) => pipeline,
                None => return Ok(image.cloned()),
            },
        };
        pipeline.run(ctx, image)
    }
}
