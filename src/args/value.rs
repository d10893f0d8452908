//! Polymorphic argument values: literals or deferred expressions.

use image::DynamicImage;

use crate::error::{DarkroomError, Result};

use super::expr::Expr;

/// A script argument resolved at execution time.
///
/// Literals are used as written; expressions (backtick-quoted in the
/// script) are evaluated against the image the element receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(String),
    Expr { source: String, expr: Expr },
}

impl Value {
    /// Interpret a token: `` `...` `` is an expression, anything else a literal.
    pub fn parse(token: &str) -> std::result::Result<Self, String> {
        match token
            .strip_prefix('`')
            .and_then(|rest| rest.strip_suffix('`'))
        {
            Some(body) if token.len() >= 2 => Ok(Value::Expr {
                source: token.to_string(),
                expr: Expr::parse(body)?,
            }),
            _ => Ok(Value::Literal(token.to_string())),
        }
    }

    /// A numeric literal.
    pub fn number(n: f64) -> Self {
        Value::Literal(n.to_string())
    }

    /// The text written back to a script.
    pub fn source(&self) -> &str {
        match self {
            Value::Literal(s) => s,
            Value::Expr { source, .. } => source,
        }
    }

    pub fn is_expr(&self) -> bool {
        matches!(self, Value::Expr { .. })
    }

    pub fn float(&self, element: &str, image: Option<&DynamicImage>) -> Result<f64> {
        match self {
            Value::Literal(s) => s.trim().parse::<f64>().map_err(|_| {
                DarkroomError::element(element, format!("'{}' is not a number", s))
            }),
            Value::Expr { expr, source } => {
                let (width, height) = if expr.uses_image() {
                    let image = image.ok_or_else(|| DarkroomError::NeedsImage {
                        element: element.to_string(),
                    })?;
                    (image.width() as f64, image.height() as f64)
                } else {
                    (0.0, 0.0)
                };
                expr.eval(width, height)
                    .map_err(|e| DarkroomError::element(element, format!("{}: {}", source, e)))
            }
        }
    }

    /// Integer view; fractional results are an error, not truncated.
    pub fn int(&self, element: &str, image: Option<&DynamicImage>) -> Result<i64> {
        if let Value::Literal(s) = self {
            if let Ok(n) = s.trim().parse::<i64>() {
                return Ok(n);
            }
        }
        let n = self.float(element, image)?;
        if n.fract() != 0.0 || !n.is_finite() {
            return Err(DarkroomError::element(
                element,
                format!("'{}' is not a whole number", self.source()),
            ));
        }
        Ok(n as i64)
    }

    /// A non-negative pixel count.
    pub fn pixels(&self, element: &str, image: Option<&DynamicImage>) -> Result<u32> {
        let n = self.float(element, image)?.round();
        if !(0.0..=u32::MAX as f64).contains(&n) {
            return Err(DarkroomError::element(
                element,
                format!("'{}' is not a valid pixel count", self.source()),
            ));
        }
        Ok(n as u32)
    }

    pub fn string(&self, element: &str, image: Option<&DynamicImage>) -> Result<String> {
        match self {
            Value::Literal(s) => Ok(s.clone()),
            Value::Expr { .. } => Ok(self.float(element, image)?.to_string()),
        }
    }
}
