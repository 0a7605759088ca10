//! suma - Non-linear structural pattern matching for object graphs
//!
//! A matching engine for querying in-memory data: patterns express the
//! *shape* of the data, wildcards capture pieces of it, and a repeated
//! wildcard alias constrains all its occurrences to bind equal values
//! (non-linear matching, like Prolog unification and unlike most regex
//! engines).
//!
//! # Architecture
//!
//! - [`Value`] — Erased subject data (scalars, sequences, maps, objects)
//! - [`ObjectNode`] — Trait bringing domain objects into the engine
//! - [`Matcher`] — The closed pattern tree: leaves, shapes, sequences,
//!   combinators
//! - [`Path`] — Navigation expressions used by shape constraints,
//!   including transitive closures
//! - [`Context`] — A binding hypothesis threaded through evaluation
//! - [`MatchResult`] — Every successful hypothesis with its bindings
//!
//! # Key Design Insights
//!
//! 1. **Type erasure at data level**: matchers are non-generic and judge
//!    [`Value`]s; domains plug in through [`ObjectNode`], not through
//!    generics.
//!
//! 2. **Context-passing evaluation**: matchers receive one hypothesis
//!    and return every hypothesis they explored. Alternatives never
//!    share binding state; branches clone.
//!
//! 3. **Deferred leaves**: a predicate over aliases that are not bound
//!    yet parks itself as an obligation on the context and fires when
//!    the last alias binds. Pattern declaration order does not matter.
//!
//! # Example
//!
//! ```
//! use suma::prelude::*;
//!
//! // {x: v, y: v, points: [head, ..., head]} — same v twice, and the
//! // point list starts and ends with the same element.
//! let pattern = Matcher::map_shape(vec![
//!     ("x", Matcher::wildcard("v")),
//!     ("y", Matcher::wildcard("v")),
//!     (
//!         "points",
//!         Matcher::sequence(vec![
//!             Matcher::wildcard("head"),
//!             Matcher::any(),
//!             Matcher::wildcard("head"),
//!         ]),
//!     ),
//! ])?;
//!
//! let subject = Value::map([
//!     ("x", 4.into()),
//!     ("y", 4.into()),
//!     ("points", Value::seq([1.into(), 2.into(), 1.into()])),
//! ]);
//!
//! let result = pattern.match_value(&subject);
//! assert!(result.is_match());
//! assert_eq!(result.bindings()[0]["v"], Value::Int(4));
//! assert_eq!(result.bindings()[0]["head"], Value::Int(1));
//! # Ok::<(), suma::PatternError>(())
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod context;
mod matcher;
mod path;
mod pattern;
mod sequence;
mod shape;
mod value;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use context::{Context, GeneratorFn, PredicateFn, SkippedObligation, SUBJECT_PARAM};
pub use matcher::{
    ConditionalMatcher, GeneratorMatcher, MatchOptions, MatchResult, Matcher, ANONYMOUS,
};
pub use path::Path;
pub use pattern::{as_matcher, is_not};
pub use shape::{MapShape, ObjectShape};
pub use value::{ObjectNode, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use suma::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        as_matcher,
        is_not,
        // Core types
        Context,
        MatchOptions,
        MatchResult,
        Matcher,
        // Traits
        ObjectNode,
        Path,
        // Errors
        PatternError,
        SkippedObligation,
        Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from pattern construction.
///
/// These are caught when a pattern is built, not during matching; matching
/// itself never fails, it just produces no successful hypothesis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// A regex leaf's expression failed to compile.
    #[error("invalid regex {pattern:?}: {reason}")]
    InvalidRegex {
        /// The expression that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },
    /// A path expression was empty.
    #[error("empty path expression")]
    EmptyPath,
    /// A composed path expression contained an empty segment, e.g. `a>>b`.
    #[error("empty segment in path expression {expression:?}")]
    EmptySegment {
        /// The offending path expression.
        expression: String,
    },
}
