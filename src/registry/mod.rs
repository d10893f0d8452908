//! Element registry: the table that maps script names to decoders.
//!
//! The registry is built once at the composition root, by explicit
//! `register` calls, and is then only read. Names are unique for its
//! whole lifetime; registering a name twice is a build mistake and fails
//! before any script is decoded.
//!
//! # Example
//!
//! ```ignore
//! use darkroom::registry::Registry;
//!
//! let mut registry = Registry::new();
//! registry.register(Contrast::DECODABLE)?;
//! registry.add_context_hook(install_cache(64 << 20));
//!
//! let root = darkroom::decode("contrast(5)", &vars, &registry)?;
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::args::Args;
use crate::engine::{Context, ContextHook, ElementRef, Mode};
use crate::error::{DarkroomError, Result};

/// Builds an element from its arguments.
pub type DecodeFn = for<'a, 'r> fn(&mut Args<'a, 'r>) -> Result<ElementRef>;

/// A registry entry: name, help text and decoder for one element kind.
#[derive(Clone, Copy)]
pub struct Decodable {
    pub name: &'static str,
    /// `(usage, description)` lines shown by `darkroom list`.
    pub help: &'static [(&'static str, &'static str)],
    pub decode: DecodeFn,
}

impl fmt::Debug for Decodable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decodable").field("name", &self.name).finish()
    }
}

/// Append-only name to [`Decodable`] table, plus the context hooks every
/// execution is seeded with.
#[derive(Default)]
pub struct Registry {
    by_name: HashMap<&'static str, Decodable>,
    /// Registration order, for listing.
    order: Vec<&'static str>,
    hooks: Vec<ContextHook>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element kind. Fails if the name is taken.
    pub fn register(&mut self, decodable: Decodable) -> Result<&mut Self> {
        if self.by_name.contains_key(decodable.name) {
            return Err(DarkroomError::DuplicateElement {
                name: decodable.name.to_string(),
            });
        }
        self.by_name.insert(decodable.name, decodable);
        self.order.push(decodable.name);
        Ok(self)
    }

    /// Register several element kinds, stopping at the first duplicate.
    pub fn register_all(&mut self, decodables: impl IntoIterator<Item = Decodable>) -> Result<&mut Self> {
        for decodable in decodables {
            self.register(decodable)?;
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Decodable> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    /// Registered element kinds in registration order.
    pub fn decodables(&self) -> impl Iterator<Item = &Decodable> {
        self.order.iter().filter_map(|name| self.by_name.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Add a callback run against the extension store of every new Context.
    pub fn add_context_hook(&mut self, hook: ContextHook) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn context_hooks(&self) -> &[ContextHook] {
        &self.hooks
    }

    /// A fresh Context seeded by this registry's hooks.
    pub fn context(&self, mode: Mode) -> Context {
        Context::new(mode, &self.hooks)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("elements", &self.order)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Extensions, Pipeline};
    use std::sync::Arc;

    fn decode_empty(args: &mut Args<'_, '_>) -> Result<ElementRef> {
        Ok(Pipeline::new(args.elements()?).into_ref())
    }

    const FIRST: Decodable = Decodable {
        name: "first",
        help: &[("first(element...)", "Runs its arguments")],
        decode: decode_empty,
    };

    const SECOND: Decodable = Decodable {
        name: "second",
        help: &[],
        decode: decode_empty,
    };

    #[test]
    fn test_empty_registry() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.get("first").is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(FIRST).unwrap().register(SECOND).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("first").unwrap().help.len(), 1);
        assert!(registry.contains("second"));
    }

    #[test]
    fn test_names_in_registration_order() {
        let mut registry = Registry::new();
        registry.register_all([SECOND, FIRST]).unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["second", "first"]);
        let listed: Vec<_> = registry.decodables().map(|d| d.name).collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry.register(FIRST).unwrap();

        let err = registry.register(FIRST).unwrap_err();
        assert!(matches!(err, DarkroomError::DuplicateElement { ref name } if name == "first"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_context_seeded_by_hooks() {
        let mut registry = Registry::new();
        registry.add_context_hook(Arc::new(|ext: &mut Extensions| ext.insert("answer", 42u8)));

        let ctx = registry.context(Mode::Edit);
        assert_eq!(ctx.mode(), Mode::Edit);
        assert_eq!(ctx.extensions().get::<u8>("answer"), Some(&42));
    }
}
