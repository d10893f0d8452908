//! Script text to entry tree.
//!
//! A script is a sequence of entries; an entry is a head token optionally
//! followed by a parenthesised argument list of further entries:
//!
//! ```text
//! // line comments start a line
//! .small(resize(`width / 2` `height / 2`))
//! load("in.jpg") .small() contrast(${amount}) save("out.png")
//! ```
//!
//! Parsing knows nothing about the registry; binding entries to elements
//! is the decoder's job.

mod entry;
mod location;
mod parser;

pub use entry::{Entry, ANONYMOUS_HEAD, SIGIL};
pub use location::Location;
pub use parser::{parse, parse_reader, Vars};
