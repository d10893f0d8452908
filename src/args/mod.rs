//! Argument reading and writing shared by every element.
//!
//! - `Args` - positional, typed decode-time access to an element's arguments
//! - `ArgWriter` - the encode-time mirror
//! - `Value` - a literal or a deferred expression (`` `width / 2` ``)
//! - `Colour` - RGBA colour arguments

mod colour;
mod expr;
mod reader;
mod value;
mod writer;

pub use colour::Colour;
pub use expr::{BinOp, Dimension, Expr};
pub use reader::Args;
pub use value::Value;
pub use writer::{quote, ArgWriter};
