//! Pattern construction protocol — plain values as patterns
//!
//! [`as_matcher`] converts a plain [`Value`] into the matcher it denotes,
//! so patterns can be written as data:
//!
//! - strings starting with `@` become single-value wildcards, strings
//!   starting with `*` become sub-sequence wildcards;
//! - sequences become sequence patterns, each element converted in turn;
//! - maps become map shapes, each value converted in turn;
//! - every other value becomes a literal (booleans a type-strict
//!   identity, so `true` does not match `1`).
//!
//! The same protocol runs at match time on generator output.

use crate::matcher::Matcher;
use crate::value::Value;
use crate::PatternError;

/// Convert a plain value into the matcher it denotes.
///
/// # Errors
///
/// Fails when a map key inside the value is not a valid path expression.
///
/// # Example
///
/// ```
/// use suma::{as_matcher, Value};
///
/// let pattern = as_matcher(&Value::seq([
///     1.into(),
///     "@x".into(),
///     "*rest".into(),
/// ]))?;
///
/// let result = pattern.match_value(&Value::seq([1.into(), 2.into(), 3.into(), 4.into()]));
/// assert!(result.is_match());
/// assert_eq!(result.bindings()[0]["x"], Value::Int(2));
/// assert_eq!(result.bindings()[0]["rest"], Value::seq([3.into(), 4.into()]));
/// # Ok::<(), suma::PatternError>(())
/// ```
pub fn as_matcher(value: &Value) -> Result<Matcher, PatternError> {
    Ok(match value {
        Value::Str(s) => from_str_pattern(s),
        Value::Bool(_) => Matcher::Identity(value.clone()),
        Value::Seq(items) => {
            let mut elements = Vec::with_capacity(items.len());
            for item in items.iter() {
                elements.push(as_matcher(item)?);
            }
            Matcher::Sequence(elements)
        }
        Value::Map(entries) => {
            let mut constraints = Vec::with_capacity(entries.len());
            for (key, item) in entries.iter() {
                constraints.push((key.as_str(), as_matcher(item)?));
            }
            Matcher::map_shape(constraints)?
        }
        other => Matcher::Literal(other.clone()),
    })
}

/// String pattern sugar: `@alias`, `*alias`, or a literal.
fn from_str_pattern(s: &str) -> Matcher {
    if let Some(alias) = s.strip_prefix('@') {
        Matcher::wildcard(alias)
    } else if let Some(alias) = s.strip_prefix('*') {
        Matcher::list_wildcard(alias)
    } else {
        Matcher::literal(s)
    }
}

/// Negate a matcher, collapsing double negation. Equivalent to
/// [`Matcher::negate`], provided as a free function for pattern-building
/// code.
#[must_use]
pub fn is_not(matcher: Matcher) -> Matcher {
    matcher.negate()
}

impl From<i64> for Matcher {
    fn from(value: i64) -> Self {
        Self::literal(value)
    }
}

impl From<f64> for Matcher {
    fn from(value: f64) -> Self {
        Self::literal(value)
    }
}

impl From<bool> for Matcher {
    fn from(value: bool) -> Self {
        Self::identity(value)
    }
}

// Strings convert with the wildcard sugar, like the value protocol.
impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        from_str_pattern(value)
    }
}

impl TryFrom<Value> for Matcher {
    type Error = PatternError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        as_matcher(&value)
    }
}
