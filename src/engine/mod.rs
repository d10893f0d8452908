//! Execution engine: elements, pipelines and the context they run in.
//!
//! Execution is sequential. A [`Pipeline`] applies its elements one after
//! another, checking the [`Context`]'s cancellation flag between steps and
//! stopping at the first error. Elements may parallelise their own pixel
//! work, but each returns before the next step begins.

mod context;
mod element;
mod pipeline;

pub use context::{CancellationToken, Context, ContextHook, Extensions, Mode};
pub use element::{require_image, Element, ElementRef};
pub use pipeline::{Halted, Pipeline, Reference};
