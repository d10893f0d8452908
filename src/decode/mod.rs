//! Binding parsed entries to the registry.
//!
//! Decoding walks the top-level entries in source order:
//!
//! - `.name(args...)` defines a named pipeline. Defining a name twice fails.
//! - `.name` / `.name()` references a pipeline defined *earlier* in the
//!   traversal. There are no forward references, so the element graph is
//!   acyclic by construction.
//! - anything else names a registered element whose decoder reads its own
//!   arguments; nested elements are decoded when the decoder asks for them.
//!
//! Consecutive top-level entries that are not definitions are gathered into
//! one anonymous pipeline, so `contrast(5) brightness(2)` is a single
//! pipeline applying contrast then brightness.

mod root;

use std::collections::HashMap;
use std::sync::Arc;

use crate::args::Args;
use crate::engine::{ElementRef, Pipeline, Reference};
use crate::error::{DarkroomError, Result};
use crate::registry::Registry;
use crate::script::{self, Entry, Vars};

pub use root::{NamedElement, Root};

/// Parse and decode a script in one step.
pub fn decode(source: &str, vars: &Vars, registry: &Registry) -> Result<Root> {
    let entries = script::parse(source, vars)?;
    decode_entries(&entries, registry)
}

/// Decode an already-parsed entry list.
pub fn decode_entries(entries: &[Entry], registry: &Registry) -> Result<Root> {
    let mut decoder = Decoder::new(registry);
    let mut root = Root::default();
    let mut anonymous: Vec<ElementRef> = Vec::new();

    for entry in entries {
        if entry.is_definition() {
            if !anonymous.is_empty() {
                root.push_anonymous(Pipeline::new(std::mem::take(&mut anonymous)));
            }
            let pipeline = decoder.define(entry)?;
            root.push_definition(pipeline);
        } else {
            anonymous.push(decoder.decode_entry(entry)?);
        }
    }
    if !anonymous.is_empty() {
        root.push_anonymous(Pipeline::new(anonymous));
    }

    Ok(root)
}

/// Decode state for one pass: the registry and the named pipelines
/// defined so far.
pub struct Decoder<'r> {
    registry: &'r Registry,
    named: HashMap<String, Arc<Pipeline>>,
}

impl<'r> Decoder<'r> {
    fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            named: HashMap::new(),
        }
    }

    /// Decode one entry wherever it appears in the tree.
    pub(crate) fn decode_entry(&mut self, entry: &Entry) -> Result<ElementRef> {
        if entry.is_reference() {
            return self.resolve(&entry.value);
        }
        if entry.is_definition() {
            let pipeline: ElementRef = self.define(entry)?;
            return Ok(pipeline);
        }

        let registry = self.registry;
        let decodable = registry
            .get(&entry.value)
            .ok_or_else(|| DarkroomError::UnknownElement {
                name: entry.value.clone(),
            })?;
        let mut args = Args::new(decodable.name, &entry.children, self);
        let element = (decodable.decode)(&mut args)?;
        args.finish()?;
        Ok(element)
    }

    /// Decode `.name(args...)` as a named pipeline and remember it.
    fn define(&mut self, entry: &Entry) -> Result<Arc<Pipeline>> {
        let name = entry.value.as_str();
        let mut args = Args::new(name, &entry.children, self);
        let elements = args.elements()?;

        if self.named.contains_key(name) {
            return Err(DarkroomError::DuplicatePipeline {
                name: name.to_string(),
            });
        }
        let pipeline = Arc::new(Pipeline::named(name, elements));
        self.named.insert(name.to_string(), Arc::clone(&pipeline));
        tracing::trace!(pipeline = name, "defined named pipeline");
        Ok(pipeline)
    }

    fn resolve(&self, name: &str) -> Result<ElementRef> {
        let target = self
            .named
            .get(name)
            .ok_or_else(|| DarkroomError::UndefinedPipeline {
                name: name.to_string(),
            })?;
        tracing::trace!(pipeline = name, "resolved named pipeline reference");
        Ok(Arc::new(Reference::new(Arc::clone(target))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ArgWriter, Value};
    use crate::engine::{Context, Element, Mode};
    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    /// Test element: remembers its decoded arguments.
    #[derive(Debug)]
    struct Marker {
        values: Vec<String>,
    }

    impl Element for Marker {
        fn name(&self) -> &str {
            "marker"
        }

        fn apply(&self, _ctx: &mut Context, image: Option<&DynamicImage>) -> Result<Option<DynamicImage>> {
            Ok(image.cloned())
        }

        fn encode(&self, w: &mut ArgWriter) {
            for v in &self.values {
                w.string(v);
            }
        }
    }

    fn decode_marker(args: &mut Args<'_, '_>) -> Result<ElementRef> {
        let mut values = Vec::new();
        while args.remaining() > 0 {
            values.push(args.string()?);
        }
        Ok(Arc::new(Marker { values }))
    }

    fn decode_typed(args: &mut Args<'_, '_>) -> Result<ElementRef> {
        let n = args.int()?;
        let f = args.float_or(0.5)?;
        let v = args.value_or(Value::number(1.0))?;
        let inner = args.element_or_none()?;
        let mut values = vec![n.to_string(), f.to_string(), v.source().to_string()];
        if let Some(inner) = inner {
            values.push(inner.name().to_string());
        }
        Ok(Arc::new(Marker { values }))
    }

    fn decode_group(args: &mut Args<'_, '_>) -> Result<ElementRef> {
        Ok(Pipeline::new(args.elements()?).into_ref())
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_all([
                crate::registry::Decodable {
                    name: "marker",
                    help: &[],
                    decode: decode_marker,
                },
                crate::registry::Decodable {
                    name: "typed",
                    help: &[],
                    decode: decode_typed,
                },
                crate::registry::Decodable {
                    name: "pipeline",
                    help: &[],
                    decode: decode_group,
                },
            ])
            .unwrap();
        registry
    }

    fn decode_ok(source: &str) -> Root {
        decode(source, &Vars::new(), &registry()).unwrap()
    }

    fn decode_err(source: &str) -> DarkroomError {
        decode(source, &Vars::new(), &registry()).unwrap_err()
    }

    #[test]
    fn test_anonymous_entries_form_one_pipeline() {
        let root = decode_ok("marker(a) marker(b)");

        assert_eq!(root.len(), 1);
        let first = &root.entries()[0];
        assert!(first.is_anonymous());
        assert_eq!(first.pipeline.len(), 2);
    }

    #[test]
    fn test_definitions_split_anonymous_runs() {
        let root = decode_ok("marker(a)\n.x(marker(b))\nmarker(c) .x");

        let names: Vec<_> = root.names().collect();
        assert_eq!(names, vec!["#1", ".x", "#2"]);
        assert_eq!(root.get("#2").unwrap().len(), 2);
    }

    #[test]
    fn test_reference_after_definition() {
        let root = decode_ok(".a(marker(1))\n.b(.a())");

        let b = root.get(".b").unwrap();
        assert_eq!(b.elements()[0].name(), ".a");
    }

    #[test]
    fn test_forward_reference_fails() {
        let err = decode_err(".b(.a())\n.a(marker(1))");
        assert_eq!(
            err.to_string(),
            "could not find definition for named pipeline '.a'"
        );
    }

    #[test]
    fn test_self_reference_fails() {
        let err = decode_err(".a(marker(1) .a)");
        assert!(matches!(err, DarkroomError::UndefinedPipeline { .. }));
    }

    #[test]
    fn test_duplicate_definition_fails() {
        let err = decode_err(".x(marker(1))\n.x(marker(2))");
        assert_eq!(err.to_string(), "duplicate entry for named pipeline '.x'");
    }

    #[test]
    fn test_nested_definition_is_visible_afterwards() {
        let root = decode_ok("pipeline(.inner(marker(1)))\n.outer(.inner)");
        assert!(root.get(".outer").is_some());

        let err = decode_err(".a(.a(marker(1)))");
        assert!(matches!(err, DarkroomError::DuplicatePipeline { .. }));
    }

    #[test]
    fn test_unknown_element() {
        let err = decode_err("foo(1)");
        assert_eq!(err.to_string(), "'foo' is not a defined element");
    }

    #[test]
    fn test_unknown_nested_element() {
        let err = decode_err("pipeline(marker(1) nope)");
        assert!(matches!(err, DarkroomError::UnknownElement { ref name } if name == "nope"));
    }

    #[test]
    fn test_argument_errors_carry_position() {
        let err = decode_err("typed(x)");
        assert_eq!(err.to_string(), "typed: argument 1: expected an integer, found 'x'");

        let err = decode_err("typed()");
        assert_eq!(err.to_string(), "typed: argument 1: missing required integer");

        let err = decode_err("typed(1 marker(2))");
        assert_eq!(
            err.to_string(),
            "typed: argument 2: expected a number, found element 'marker(...)'"
        );

        let err = decode_err("typed(1 2 3 marker 9)");
        assert_eq!(err.to_string(), "typed: argument 5: unexpected argument '9'");
    }

    #[test]
    fn test_defaults_and_lazy_elements() {
        let root = decode_ok("typed(3)");
        let pipeline = root.main().unwrap();
        let mut w = ArgWriter::new(0);
        pipeline.elements()[0].encode(&mut w);
        assert_eq!(w.into_args(), vec!["3", "0.5", "1"]);

        let root = decode_ok("typed(3 0.25 9 marker)");
        let mut w = ArgWriter::new(0);
        root.main().unwrap().elements()[0].encode(&mut w);
        assert_eq!(w.into_args(), vec!["3", "0.25", "9", "marker"]);
    }

    #[test]
    fn test_variables_reach_arguments() {
        let vars: Vars = [("n".to_string(), "7".to_string())].into_iter().collect();
        let root = decode("typed(${n})", &vars, &registry()).unwrap();
        let mut w = ArgWriter::new(0);
        root.main().unwrap().elements()[0].encode(&mut w);
        assert_eq!(w.into_args()[0], "7");

        let err = decode("typed(${n})", &Vars::new(), &registry()).unwrap_err();
        assert!(matches!(err, DarkroomError::UnknownVariable { .. }));
    }

    #[test]
    fn test_decoded_root_runs() {
        let root = decode_ok(".keep(marker(1))\n.keep");
        let mut ctx = Context::new(Mode::Script, &[]);
        let out = root.run(None, &mut ctx, None).unwrap();
        assert!(out.is_none());
    }
}
