//! Encode-time mirror of [`Args`](super::Args).

use crate::encode::render_element;
use crate::engine::Element;
use crate::script::SIGIL;

use super::colour::Colour;
use super::value::Value;

/// Collects an element's rendered arguments, in decode order.
///
/// Layout (inline or one argument per line) is decided by the encoder from
/// [`Element::inline`]; plugins only state what their arguments are.
#[derive(Debug, Default)]
pub struct ArgWriter {
    depth: usize,
    args: Vec<String>,
}

impl ArgWriter {
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            depth,
            args: Vec::new(),
        }
    }

    pub(crate) fn into_args(self) -> Vec<String> {
        self.args
    }

    /// A string, quoted and escaped when it would not survive as a bare token.
    pub fn string(&mut self, s: &str) {
        self.args.push(quote(s));
    }

    pub fn int(&mut self, n: i64) {
        self.args.push(n.to_string());
    }

    pub fn float(&mut self, n: f64) {
        self.args.push(n.to_string());
    }

    pub fn value(&mut self, value: &Value) {
        match value {
            Value::Literal(s) => self.string(s),
            Value::Expr { source, .. } => self.args.push(source.clone()),
        }
    }

    pub fn colour(&mut self, colour: Colour) {
        self.args.push(colour.to_string());
    }

    /// A nested element, rendered one level deeper.
    pub fn element(&mut self, element: &dyn Element) {
        self.args.push(render_element(element, self.depth + 1));
    }
}

/// Quote `s` if it is empty or contains anything the tokenizer treats specially.
pub fn quote(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s.starts_with(SIGIL)
        || s.starts_with("//")
        || s.chars().any(|c| {
            c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\' | '`' | '$')
        });
    if !needs_quotes {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
