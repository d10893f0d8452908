//! darkroom - declarative photo-editing pipelines
//!
//! A script such as
//!
//! ```text
//! .base(load("in.jpg") resize(`w / 2` `h / 2`))
//! .base contrast(5) brightness(2) save("out.png")
//! ```
//!
//! is parsed into an entry tree ([`script`]), bound to a [`Registry`] of
//! element decoders ([`decode`]), and run as a tree of [`Element`]s inside a
//! per-execution [`Context`] ([`engine`]). [`encode`] turns a decoded tree
//! back into canonical script text.

pub mod args;
pub mod cache;
pub mod cli;
pub mod config;
pub mod decode;
pub mod elements;
pub mod encode;
pub mod engine;
pub mod error;
pub mod output;
pub mod registry;
pub mod script;

pub use args::{Args, ArgWriter, Colour, Value};
pub use cache::{install_cache, Cached, Fingerprint, ImageCache, SharedCache};
pub use config::Config;
pub use decode::{decode, decode_entries, NamedElement, Root};
pub use elements::builtin_registry;
pub use encode::{encode, encode_element};
pub use engine::{CancellationToken, Context, ContextHook, Element, ElementRef, Extensions, Halted, Mode, Pipeline};
pub use error::{DarkroomError, Result};
pub use registry::{Decodable, Registry};
pub use script::{parse, Entry, Location, Vars};
