//! The untyped parse tree.

use super::location::Location;

/// Head character marking a named-pipeline definition or reference.
pub const SIGIL: char = '.';

/// Synthetic head given to a parenthesised list with no name: `(a b)`.
pub const ANONYMOUS_HEAD: &str = "pipeline";

/// A parse-tree node: a head token and its ordered arguments.
///
/// Leaves (no children) are scalar literals or zero-argument invocations;
/// which one is decided by whoever consumes the argument.
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: String,
    pub children: Vec<Entry>,
    /// Where the head token started. Diagnostic only: not part of equality.
    pub location: Location,
}

impl Entry {
    pub fn new(value: impl Into<String>, location: Location) -> Self {
        Self {
            value: value.into(),
            children: Vec::new(),
            location,
        }
    }

    /// Build an entry with children at the start location (tests and tooling).
    pub fn with_children(value: impl Into<String>, children: Vec<Entry>) -> Self {
        Self {
            value: value.into(),
            children,
            location: Location::start(),
        }
    }

    pub fn leaf(value: impl Into<String>) -> Self {
        Self::new(value, Location::start())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether the head carries the named-pipeline sigil.
    pub fn is_named(&self) -> bool {
        self.value.len() > 1 && self.value.starts_with(SIGIL)
    }

    /// `.name(...)` with at least one argument.
    pub fn is_definition(&self) -> bool {
        self.is_named() && !self.children.is_empty()
    }

    /// `.name` or `.name()`.
    pub fn is_reference(&self) -> bool {
        self.is_named() && self.children.is_empty()
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.children == other.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_and_reference() {
        let def = Entry::with_children(".main", vec![Entry::leaf("grayscale")]);
        let reference = Entry::leaf(".main");

        assert!(def.is_definition());
        assert!(!def.is_reference());
        assert!(reference.is_reference());
        assert!(!Entry::leaf(".").is_named());
        assert!(!Entry::leaf("main").is_named());
    }

    #[test]
    fn test_equality_ignores_location() {
        let a = Entry::new("rotate", Location::new(10, 2, 4));
        let b = Entry::leaf("rotate");
        assert_eq!(a, b);
    }
}
