//! `Path` — Navigation expressions used by shape matcher constraints
//!
//! A shape constraint pairs a path with a matcher: the path resolves a set
//! of candidate values from the subject, the matcher is then applied to
//! them. Paths form a tiny language:
//!
//! | Expression | Meaning |
//! |------------|---------|
//! | `name`     | direct field (or map key) access |
//! | `a>b>c`    | composition, left to right |
//! | `name*`    | transitive closure of `name` (zero or more hops) |
//! | `name+`    | one or more hops of `name` |
//! | `*`        | all structural descendants |
//!
//! Resolution never fails: a path that leads nowhere resolves to an empty
//! candidate set, and the constraint simply has nothing to match.

use crate::value::{flatten, IdentitySet, Value};
use crate::PatternError;

/// A parsed navigation expression.
///
/// Build with [`Path::parse`]; shape constructors call it for you.
///
/// # Example
///
/// ```
/// use suma::{Path, Value};
///
/// let path = Path::parse("inner>value", true)?;
/// let subject = Value::map([(
///     "inner",
///     Value::map([("value", 42.into())]),
/// )]);
/// assert_eq!(path.resolve_from(&subject), vec![42.into()]);
/// # Ok::<(), suma::PatternError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    /// Field access on an object node.
    Direct(String),
    /// Key access on a map.
    Key(String),
    /// Left-to-right composition of steps.
    Composed(Vec<Path>),
    /// Transitive closure of a step: everything reachable by applying it
    /// one or more times, each node reported once.
    Recursive(Box<Path>),
    /// Structural descendant closure: every node reachable through any
    /// field or map entry, transitively.
    Children,
}

impl Path {
    /// Parse a navigation expression.
    ///
    /// `dictkey` decides how bare names resolve: map-key access when
    /// `true`, object-field access when `false`. Map shapes parse their
    /// paths with `dictkey = true`, object shapes with `false`.
    ///
    /// # Errors
    ///
    /// [`PatternError::EmptyPath`] for an empty expression, and
    /// [`PatternError::EmptySegment`] when a composition contains an empty
    /// segment (`"a>>b"`).
    pub fn parse(expression: &str, dictkey: bool) -> Result<Self, PatternError> {
        if expression.is_empty() {
            return Err(PatternError::EmptyPath);
        }
        if expression.contains('>') {
            let mut steps = Vec::new();
            for segment in expression.split('>') {
                if segment.is_empty() {
                    return Err(PatternError::EmptySegment {
                        expression: expression.to_string(),
                    });
                }
                steps.push(Self::parse(segment, dictkey)?);
            }
            return Ok(Self::Composed(steps));
        }
        if expression == "*" {
            return Ok(Self::Children);
        }
        if let Some(rest) = expression.strip_suffix('*') {
            return Ok(Self::Recursive(Box::new(Self::parse(rest, dictkey)?)));
        }
        if let Some(rest) = expression.strip_suffix('+') {
            // p+ is sugar for p then p*.
            let step = Self::parse(rest, dictkey)?;
            let closure = Self::Recursive(Box::new(step.clone()));
            return Ok(Self::Composed(vec![step, closure]));
        }
        Ok(if dictkey {
            Self::Key(expression.to_string())
        } else {
            Self::Direct(expression.to_string())
        })
    }

    /// Whether this step is a closure step.
    ///
    /// In a composition, candidates flowing into a closure step are kept
    /// alongside what the step produces; a non-closure step replaces them.
    #[must_use]
    pub fn is_recursive(&self) -> bool {
        matches!(self, Self::Recursive(_) | Self::Children)
    }

    /// Resolve this path against a subject, producing candidate values.
    ///
    /// Resolved sequences are flattened into their elements; maps are not.
    /// Missing fields or keys resolve to nothing.
    #[must_use]
    pub fn resolve_from(&self, subject: &Value) -> Vec<Value> {
        match self {
            Self::Direct(name) => match subject {
                Value::Object(node) => {
                    node.field(name).map(|v| flatten(&v)).unwrap_or_default()
                }
                _ => Vec::new(),
            },
            Self::Key(name) => match subject {
                Value::Map(map) => map.get(name).map(flatten).unwrap_or_default(),
                _ => Vec::new(),
            },
            Self::Composed(steps) => {
                let mut candidates = vec![subject.clone()];
                for step in steps {
                    let sources = candidates.clone();
                    if !step.is_recursive() {
                        candidates.clear();
                    }
                    for source in &sources {
                        candidates.extend(step.resolve_from(source));
                    }
                }
                candidates
            }
            Self::Recursive(step) => {
                let mut seen = IdentitySet::default();
                let mut reached = Vec::new();
                resolve_transitive(step, subject, &mut seen, &mut reached);
                reached
            }
            Self::Children => {
                let mut seen = IdentitySet::default();
                let mut reached = Vec::new();
                resolve_descendants(subject, &mut seen, &mut reached);
                reached
            }
        }
    }
}

/// Transitive closure of `step` from `node`, breadth-first per hop: the
/// whole batch a node produces is reported before any of it is expanded.
///
/// The root is marked visited only after its own batch is filtered, so a
/// direct self-loop reports the root once.
fn resolve_transitive(
    step: &Path,
    node: &Value,
    seen: &mut IdentitySet,
    reached: &mut Vec<Value>,
) {
    let mut fresh = Vec::new();
    for produced in step.resolve_from(node) {
        for candidate in flatten(&produced) {
            if !candidate.is_null() && !seen.contains(&candidate) {
                seen.insert(&candidate);
                fresh.push(candidate);
            }
        }
    }
    seen.insert(node);
    reached.extend(fresh.iter().cloned());
    for next in &fresh {
        resolve_transitive(step, next, seen, reached);
    }
}

/// Structural descendant closure: walks every field of objects and every
/// entry of maps. Scalars and sequences have no structure of their own
/// (sequence elements surface through flattening at the parent).
fn resolve_descendants(node: &Value, seen: &mut IdentitySet, reached: &mut Vec<Value>) {
    let children: Vec<Value> = match node {
        Value::Object(obj) => obj.fields().into_iter().map(|(_, v)| v).collect(),
        Value::Map(map) => map.values().cloned().collect(),
        _ => return,
    };
    for child in children {
        let mut fresh = Vec::new();
        for candidate in flatten(&child) {
            if !candidate.is_null() && !seen.contains(&candidate) {
                seen.insert(&candidate);
                fresh.push(candidate);
            }
        }
        seen.insert(node);
        reached.extend(fresh.iter().cloned());
        for next in &fresh {
            resolve_descendants(next, seen, reached);
        }
    }
}
