//! Deferred arithmetic over the current image's dimensions.
//!
//! Supports:
//! - numeric literals: `2`, `0.5`
//! - dimensions: `width`/`w`, `height`/`h`
//! - `+ - * / %`, unary minus and parentheses

use std::fmt;

/// An image dimension an expression can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div | BinOp::Rem => 2,
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Dim(Dimension),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Op(c) => write!(f, "{}", c),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
        }
    }
}

impl Expr {
    /// Parse an expression body (without the surrounding backticks).
    pub fn parse(input: &str) -> Result<Self, String> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        // Bounds the tree depth, and with it the recursion in eval and drop.
        if tokens.len() > MAX_TOKENS {
            return Err(format!("expression has more than {} tokens", MAX_TOKENS));
        }
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.expr(0)?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some(extra) => Err(format!("unexpected '{}' in expression", extra)),
        }
    }

    /// Evaluate against the given image dimensions.
    pub fn eval(&self, width: f64, height: f64) -> Result<f64, String> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Dim(Dimension::Width) => Ok(width),
            Expr::Dim(Dimension::Height) => Ok(height),
            Expr::Neg(inner) => Ok(-inner.eval(width, height)?),
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.eval(width, height)?;
                let b = rhs.eval(width, height)?;
                match op {
                    BinOp::Add => Ok(a + b),
                    BinOp::Sub => Ok(a - b),
                    BinOp::Mul => Ok(a * b),
                    BinOp::Div | BinOp::Rem if b == 0.0 => Err("division by zero".to_string()),
                    BinOp::Div => Ok(a / b),
                    BinOp::Rem => Ok(a % b),
                }
            }
        }
    }

    /// Whether evaluating this needs an image.
    pub fn uses_image(&self) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::Dim(_) => true,
            Expr::Neg(inner) => inner.uses_image(),
            Expr::Binary { lhs, rhs, .. } => lhs.uses_image() || rhs.uses_image(),
        }
    }
}

/// Longest expression accepted, in tokens.
const MAX_TOKENS: usize = 256;

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut number = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = number
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{}'", number))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => return Err(format!("unexpected character '{}' in expression", other)),
        }
    }

    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek_op(&self) -> Option<BinOp> {
        match self.tokens.get(self.pos) {
            Some(Token::Op('+')) => Some(BinOp::Add),
            Some(Token::Op('-')) => Some(BinOp::Sub),
            Some(Token::Op('*')) => Some(BinOp::Mul),
            Some(Token::Op('/')) => Some(BinOp::Div),
            Some(Token::Op('%')) => Some(BinOp::Rem),
            _ => None,
        }
    }

    /// Precedence climbing; all operators are left-associative.
    fn expr(&mut self, min_precedence: u8) -> Result<Expr, String> {
        let mut lhs = self.atom()?;
        while let Some(op) = self.peek_op() {
            if op.precedence() <= min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = self.expr(op.precedence())?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => match name.as_str() {
                "width" | "w" => Ok(Expr::Dim(Dimension::Width)),
                "height" | "h" => Ok(Expr::Dim(Dimension::Height)),
                _ => Err(format!("unknown name '{}' (expected width or height)", name)),
            },
            Some(Token::Op('-')) => Ok(Expr::Neg(Box::new(self.atom()?))),
            Some(Token::Open) => {
                let inner = self.expr(0)?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err("missing ')' in expression".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected '{}' in expression", other)),
            None => Err("expression ends early".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> f64 {
        Expr::parse(src).unwrap().eval(640.0, 480.0).unwrap()
    }

    #[test]
    fn test_literals_and_dimensions() {
        assert_eq!(eval("2"), 2.0);
        assert_eq!(eval("0.5"), 0.5);
        assert_eq!(eval("width"), 640.0);
        assert_eq!(eval("h"), 480.0);
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("64 / 4 / 2"), 8.0);
        assert_eq!(eval("width / 2 - height % 7"), 320.0 - 4.0);
        assert_eq!(eval("-w + 1"), -639.0);
    }

    #[test]
    fn test_division_by_zero() {
        let expr = Expr::parse("w / (h - h)").unwrap();
        assert_eq!(expr.eval(1.0, 1.0), Err("division by zero".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Expr::parse("").is_err());
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("(1 + 2").is_err());
        assert!(Expr::parse("depth * 2").is_err());
        assert!(Expr::parse("1 2").is_err());
        assert!(Expr::parse("2 ^ 3").is_err());
    }

    #[test]
    fn test_long_expressions_rejected() {
        let deep = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        assert_eq!(
            Expr::parse(&deep).unwrap_err(),
            "expression has more than 256 tokens"
        );
        assert!(Expr::parse(&vec!["1"; 200].join("+")).is_err());
        assert!(Expr::parse(&vec!["1"; 100].join("+")).is_ok());
    }

    #[test]
    fn test_uses_image() {
        assert!(!Expr::parse("1 + 2").unwrap().uses_image());
        assert!(Expr::parse("1 + w").unwrap().uses_image());
    }
}
