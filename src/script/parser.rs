//! Single-pass tokenizer building the entry tree.
//!
//! Lexical rules:
//! - whitespace separates tokens, `(` and `)` open and close an argument list
//! - `"..."` is a literal string; inside it `\` escapes the next character
//! - `` `...` `` is an expression literal, kept verbatim (backticks included)
//! - `${name}` outside strings is replaced by the caller-supplied variable,
//!   including inside expressions: `` `w * ${scale}` ``
//! - `//` is a comment only when it is the first thing on a line
//!
//! Argument lists nest at most [`MAX_DEPTH`] levels deep.

use std::collections::HashMap;
use std::io::Read;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{DarkroomError, Result};

use super::entry::{Entry, ANONYMOUS_HEAD};
use super::location::Location;

/// Deepest allowed nesting of argument lists.
pub const MAX_DEPTH: usize = 256;

/// Variables available to `${name}` substitution.
pub type Vars = HashMap<String, String>;

/// Parse script text into its top-level entries.
pub fn parse(source: &str, vars: &Vars) -> Result<Vec<Entry>> {
    Parser::new(source, vars).run()
}

/// Parse a script from a reader; read failures are reported as IO errors.
pub fn parse_reader<R: Read>(mut reader: R, vars: &Vars) -> Result<Vec<Entry>> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    parse(&source, vars)
}

/// The token currently being accumulated.
#[derive(Default)]
struct Token {
    text: String,
    /// A quoted token survives even when empty: `""`.
    quoted: bool,
    start: Option<Location>,
}

impl Token {
    fn push(&mut self, c: char, at: Location) {
        self.start.get_or_insert(at);
        self.text.push(c);
    }

    fn push_str(&mut self, s: &str, at: Location) {
        self.start.get_or_insert(at);
        self.text.push_str(s);
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.quoted
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    vars: &'a Vars,
    /// Location of the next character to be read.
    here: Location,
    /// Open invocations; `stack[0]` collects the top-level entries.
    stack: Vec<Entry>,
    token: Token,
    /// Only whitespace seen since the last newline.
    line_start: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, vars: &'a Vars) -> Self {
        Self {
            chars: source.chars().peekable(),
            vars,
            here: Location::start(),
            stack: vec![Entry::new("", Location::start())],
            token: Token::default(),
            line_start: true,
        }
    }

    fn next(&mut self) -> Option<(char, Location)> {
        let at = self.here;
        let c = self.chars.next()?;
        self.here.advance(c);
        Some((c, at))
    }

    fn error(&self, message: impl Into<String>, location: Location) -> DarkroomError {
        DarkroomError::Parse {
            message: message.into(),
            location,
        }
    }

    fn run(mut self) -> Result<Vec<Entry>> {
        while let Some((c, at)) = self.next() {
            match c {
                '"' => {
                    self.token.quoted = true;
                    self.token.start.get_or_insert(at);
                    self.read_string(at)?;
                }
                '`' => self.read_expression(at)?,
                '\\' => match self.next() {
                    Some((escaped, _)) => self.token.push(escaped, at),
                    None => return Err(self.error("input ends after '\\'", at)),
                },
                '$' if self.chars.peek() == Some(&'{') => self.substitute(at)?,
                '/' if self.line_start && self.chars.peek() == Some(&'/') => {
                    self.skip_comment();
                    continue;
                }
                '(' => self.open(at)?,
                ')' => self.close(at)?,
                c if c.is_whitespace() => {
                    self.flush();
                    if c == '\n' {
                        self.line_start = true;
                    }
                    continue;
                }
                c => self.token.push(c, at),
            }
            self.line_start = false;
        }

        self.flush();
        if self.stack.len() > 1 {
            let open = &self.stack[self.stack.len() - 1];
            return Err(self.error(format!("'{}(' is never closed", open.value), open.location));
        }
        let root = self.stack.pop().unwrap_or_else(|| Entry::new("", Location::start()));
        Ok(root.children)
    }

    fn read_string(&mut self, opened: Location) -> Result<()> {
        loop {
            match self.next() {
                Some(('"', _)) => return Ok(()),
                Some(('\\', at)) => match self.next() {
                    Some((escaped, _)) => self.token.push(escaped, at),
                    None => return Err(self.error("input ends after '\\' in string", at)),
                },
                Some((c, at)) => self.token.push(c, at),
                None => return Err(self.error("unterminated string", opened)),
            }
        }
    }

    fn read_expression(&mut self, opened: Location) -> Result<()> {
        self.token.push('`', opened);
        loop {
            match self.next() {
                Some(('`', at)) => {
                    self.token.push('`', at);
                    return Ok(());
                }
                Some(('$', at)) if self.chars.peek() == Some(&'{') => self.substitute(at)?,
                Some((c, at)) => self.token.push(c, at),
                None => return Err(self.error("unterminated expression", opened)),
            }
        }
    }

    fn substitute(&mut self, at: Location) -> Result<()> {
        self.next(); // '{'
        let mut name = String::new();
        loop {
            match self.next() {
                Some(('}', _)) => break,
                Some((c, _)) => name.push(c),
                None => return Err(self.error("unterminated '${'", at)),
            }
        }
        let value = self
            .vars
            .get(&name)
            .ok_or(DarkroomError::UnknownVariable { name, location: at })?;
        self.token.push_str(value, at);
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some((c, _)) = self.next() {
            if c == '\n' {
                break;
            }
        }
        self.line_start = true;
    }

    /// Record the pending token as a leaf argument of the innermost entry.
    fn flush(&mut self) {
        let token = std::mem::take(&mut self.token);
        if token.is_empty() {
            return;
        }
        let location = token.start.unwrap_or(self.here);
        self.push_child(Entry::new(token.text, location));
    }

    fn push_child(&mut self, entry: Entry) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(entry);
        }
    }

    fn open(&mut self, at: Location) -> Result<()> {
        // stack[0] is the top level, not an open list.
        if self.stack.len() > MAX_DEPTH {
            return Err(self.error(
                format!("argument lists nest deeper than {} levels", MAX_DEPTH),
                at,
            ));
        }
        let token = std::mem::take(&mut self.token);
        let (head, location) = if token.is_empty() {
            (ANONYMOUS_HEAD.to_string(), at)
        } else {
            (token.text, token.start.unwrap_or(at))
        };
        self.stack.push(Entry::new(head, location));
        Ok(())
    }

    fn close(&mut self, at: Location) -> Result<()> {
        self.flush();
        if self.stack.len() < 2 {
            return Err(self.error("unexpected ')'", at));
        }
        if let Some(done) = self.stack.pop() {
            self.push_child(done);
        }
        Ok(())
    }
}
