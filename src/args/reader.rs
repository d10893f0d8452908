//! Positional, typed access to an element's arguments during decode.

use crate::decode::Decoder;
use crate::engine::ElementRef;
use crate::error::{DarkroomError, Result};
use crate::script::Entry;

use super::colour::Colour;
use super::value::Value;

/// A cursor over one element's argument entries.
///
/// Every accessor consumes the next argument. Required accessors fail when
/// the arguments are exhausted; `_or` variants return the default instead.
/// Nested elements are decoded only when [`Args::element`] asks for them.
pub struct Args<'a, 'r> {
    element: &'a str,
    entries: &'a [Entry],
    position: usize,
    decoder: &'a mut Decoder<'r>,
}

impl<'a, 'r> Args<'a, 'r> {
    pub(crate) fn new(element: &'a str, entries: &'a [Entry], decoder: &'a mut Decoder<'r>) -> Self {
        Self {
            element,
            entries,
            position: 0,
            decoder,
        }
    }

    /// Name of the element whose arguments these are.
    pub fn element_name(&self) -> &str {
        self.element
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.position)
    }

    /// An argument error at a 1-based position.
    fn error_at(&self, index: usize, message: impl Into<String>) -> DarkroomError {
        DarkroomError::Argument {
            element: self.element.to_string(),
            index,
            message: message.into(),
        }
    }

    /// Reject the most recently consumed argument.
    pub fn reject(&self, message: impl Into<String>) -> DarkroomError {
        self.error_at(self.position.max(1), message)
    }

    fn next_entry(&mut self, what: &str) -> Result<&'a Entry> {
        let entries = self.entries;
        match entries.get(self.position) {
            Some(entry) => {
                self.position += 1;
                Ok(entry)
            }
            None => Err(self.error_at(self.position + 1, format!("missing required {}", what))),
        }
    }

    fn next_scalar(&mut self, what: &str) -> Result<&'a str> {
        let entry = self.next_entry(what)?;
        if !entry.is_leaf() {
            return Err(self.reject(format!(
                "expected a {}, found element '{}(...)'",
                what, entry.value
            )));
        }
        Ok(&entry.value)
    }

    pub fn string(&mut self) -> Result<String> {
        self.next_scalar("string").map(|s| s.to_string())
    }

    pub fn string_or(&mut self, default: &str) -> Result<String> {
        if self.remaining() == 0 {
            return Ok(default.to_string());
        }
        self.string()
    }

    pub fn int(&mut self) -> Result<i64> {
        let token = self.next_scalar("integer")?;
        token
            .parse::<i64>()
            .map_err(|_| self.reject(format!("expected an integer, found '{}'", token)))
    }

    pub fn int_or(&mut self, default: i64) -> Result<i64> {
        if self.remaining() == 0 {
            return Ok(default);
        }
        self.int()
    }

    pub fn float(&mut self) -> Result<f64> {
        let token = self.next_scalar("number")?;
        token
            .parse::<f64>()
            .map_err(|_| self.reject(format!("expected a number, found '{}'", token)))
    }

    pub fn float_or(&mut self, default: f64) -> Result<f64> {
        if self.remaining() == 0 {
            return Ok(default);
        }
        self.float()
    }

    /// A literal or a backtick expression, resolved at execution time.
    pub fn value(&mut self) -> Result<Value> {
        let token = self.next_scalar("value")?;
        Value::parse(token).map_err(|e| self.reject(e))
    }

    pub fn value_or(&mut self, default: Value) -> Result<Value> {
        if self.remaining() == 0 {
            return Ok(default);
        }
        self.value()
    }

    pub fn colour(&mut self) -> Result<Colour> {
        let token = self.next_scalar("colour")?;
        Colour::from_hex(token).map_err(|e| self.reject(e))
    }

    pub fn colour_or(&mut self, default: Colour) -> Result<Colour> {
        if self.remaining() == 0 {
            return Ok(default);
        }
        self.colour()
    }

    /// Decode the next argument as an element (`name(...)`, bare `name`,
    /// or a named-pipeline definition/reference).
    pub fn element(&mut self) -> Result<ElementRef> {
        let entry = self.next_entry("element")?;
        self.decoder.decode_entry(entry)
    }

    pub fn element_or_none(&mut self) -> Result<Option<ElementRef>> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        self.element().map(Some)
    }

    /// Decode every remaining argument as an element, in order.
    pub fn elements(&mut self) -> Result<Vec<ElementRef>> {
        let mut elements = Vec::with_capacity(self.remaining());
        while self.remaining() > 0 {
            elements.push(self.element()?);
        }
        Ok(elements)
    }

    /// Fail if arguments were left unconsumed.
    pub fn finish(&self) -> Result<()> {
        if self.remaining() > 0 {
            return Err(self.error_at(
                self.position + 1,
                format!("unexpected argument '{}'", self.entries[self.position].value),
            ));
        }
        Ok(())
    }
}
