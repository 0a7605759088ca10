//! `Matcher` — The pattern tree and its evaluation entry points
//!
//! Patterns are trees of [`Matcher`] variants. Leaves judge a single
//! subject (literals, identity, wildcards, regexes, ranges, callables);
//! interior nodes structure the search (shapes, sequences, combinators).
//!
//! Evaluation is context-passing: a matcher receives one binding
//! hypothesis and returns every hypothesis it could produce, successes
//! and failures alike. Callers filter on [`Context::is_match`]. The entry
//! points [`Matcher::match_value`] and [`Matcher::match_with`] do this
//! filtering and hand back a [`MatchResult`].
//!
//! # Example
//!
//! ```
//! use suma::{Matcher, Value};
//!
//! // [_, x, ..., x] : second element recurs somewhere in the tail.
//! let pattern = Matcher::sequence(vec![
//!     Matcher::wildcard("_"),
//!     Matcher::wildcard("x"),
//!     Matcher::any(),
//!     Matcher::wildcard("x"),
//!     Matcher::any(),
//! ]);
//!
//! let subject = Value::seq([9.into(), 3.into(), 7.into(), 3.into(), 5.into()]);
//! let result = pattern.match_value(&subject);
//! assert!(result.is_match());
//! assert_eq!(result.contexts()[0].lookup("x"), Some(&Value::Int(3)));
//! ```

use std::fmt;

use regex::Regex;

use crate::context::{Context, DeferredOp, GeneratorFn, Obligation, PredicateFn, SkippedObligation};
use crate::pattern::as_matcher;
use crate::sequence::match_sequence;
use crate::shape::{MapShape, ObjectShape};
use crate::value::Value;
use crate::PatternError;

/// Alias marking a wildcard as anonymous: it matches without binding.
pub const ANONYMOUS: &str = "_";

/// A callable leaf: a predicate over alias bindings.
///
/// Parameters name aliases bound elsewhere in the pattern; the reserved
/// parameter [`SUBJECT_PARAM`](crate::SUBJECT_PARAM) receives the subject
/// the leaf is applied to. If some parameter is unbound when the leaf is
/// reached, evaluation is deferred as an obligation on the context.
#[derive(Clone)]
pub struct ConditionalMatcher {
    pub(crate) params: Vec<String>,
    pub(crate) func: PredicateFn,
}

impl fmt::Debug for ConditionalMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalMatcher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A callable leaf that produces a value, which is then converted to a
/// matcher and applied to the subject. Defers like a conditional when its
/// parameters are not yet bound.
#[derive(Clone)]
pub struct GeneratorMatcher {
    pub(crate) params: Vec<String>,
    pub(crate) func: GeneratorFn,
}

impl fmt::Debug for GeneratorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorMatcher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A structural pattern.
///
/// The set of variants is closed: evaluation is a single dispatch in
/// [`match_context`](Matcher::match_context), and capability checks like
/// [`is_list_wildcard`](Matcher::is_list_wildcard) are plain matches.
/// Construct through the associated functions or [`as_matcher`].
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Succeeds when the subject equals the value (structural equality,
    /// numeric cross-comparison included).
    Literal(Value),
    /// Succeeds when the subject *is* the value: same allocation for
    /// composites, type-strict equality for scalars.
    Identity(Value),
    /// Matches any single value. A named wildcard binds its alias, and a
    /// recurring alias must bind equal values. `ANONYMOUS` never binds.
    Wildcard(String),
    /// Matches a sub-sequence of any length inside a sequence pattern.
    /// Binds the matched slice when named.
    ListWildcard(String),
    /// Matches an object of a declared type whose constraints all hold.
    Object(ObjectShape),
    /// Matches a map by keyed constraints.
    Map(MapShape),
    /// Matches a sequence element-wise, with backtracking around list
    /// wildcards.
    Sequence(Vec<Matcher>),
    /// Inverts the inner matcher's verdicts.
    Not(Box<Matcher>),
    /// Left-biased alternative: the right side runs only when the left
    /// produced no successful hypothesis.
    Or(Box<Matcher>, Box<Matcher>),
    /// Binds the subject to an alias, then applies the inner matcher to
    /// the same subject.
    Save {
        /// Alias the subject is bound to.
        alias: String,
        /// Matcher applied to the subject after binding.
        inner: Box<Matcher>,
    },
    /// Succeeds when the subject is a string matched by the expression.
    Regex(Regex),
    /// Succeeds when the subject is a number in `[min, max)`.
    Range {
        /// Inclusive lower bound.
        min: f64,
        /// Exclusive upper bound.
        max: f64,
    },
    /// Deferred predicate leaf.
    Conditional(ConditionalMatcher),
    /// Deferred generator leaf.
    Generator(GeneratorMatcher),
}

// ═══════════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════════

impl Matcher {
    /// Equality against a concrete value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Identity against a concrete value.
    pub fn identity(value: impl Into<Value>) -> Self {
        Self::Identity(value.into())
    }

    /// A single-value wildcard. An empty alias or [`ANONYMOUS`] matches
    /// without binding.
    pub fn wildcard(alias: impl Into<String>) -> Self {
        let alias: String = alias.into();
        if alias.is_empty() {
            Self::Wildcard(ANONYMOUS.to_string())
        } else {
            Self::Wildcard(alias)
        }
    }

    /// A sub-sequence wildcard for use inside [`Matcher::sequence`]. An
    /// empty alias or [`ANONYMOUS`] matches without binding.
    pub fn list_wildcard(alias: impl Into<String>) -> Self {
        let alias: String = alias.into();
        if alias.is_empty() {
            Self::ListWildcard(ANONYMOUS.to_string())
        } else {
            Self::ListWildcard(alias)
        }
    }

    /// An anonymous sub-sequence wildcard: any gap of any length.
    #[must_use]
    pub fn any() -> Self {
        Self::ListWildcard(ANONYMOUS.to_string())
    }

    /// An element-wise sequence pattern.
    #[must_use]
    pub fn sequence(elements: Vec<Matcher>) -> Self {
        Self::Sequence(elements)
    }

    /// An object shape matching type `class` exactly, with path
    /// constraints.
    ///
    /// # Errors
    ///
    /// Fails when a constraint path does not parse.
    pub fn object_shape(
        class: impl Into<String>,
        constraints: Vec<(&str, Matcher)>,
    ) -> Result<Self, PatternError> {
        Ok(Self::Object(ObjectShape::new(class, constraints, false)?))
    }

    /// An object shape accepting subtypes of `class`, per
    /// [`ObjectNode::has_type`](crate::ObjectNode::has_type).
    ///
    /// # Errors
    ///
    /// Fails when a constraint path does not parse.
    pub fn object_shape_subtypes(
        class: impl Into<String>,
        constraints: Vec<(&str, Matcher)>,
    ) -> Result<Self, PatternError> {
        Ok(Self::Object(ObjectShape::new(class, constraints, true)?))
    }

    /// A map shape with keyed constraints. Paths are parsed in map-key
    /// mode.
    ///
    /// # Errors
    ///
    /// Fails when a constraint path does not parse.
    pub fn map_shape(constraints: Vec<(&str, Matcher)>) -> Result<Self, PatternError> {
        Ok(Self::Map(MapShape::new(constraints)?))
    }

    /// A regular-expression leaf over string subjects.
    ///
    /// # Errors
    ///
    /// Fails when the expression is not a valid regex.
    ///
    /// # Example
    ///
    /// ```
    /// use suma::{Matcher, Value};
    ///
    /// let m = Matcher::regex("^v[0-9]+$")?;
    /// assert!(m.match_value(&Value::from("v12")).is_match());
    /// assert!(!m.match_value(&Value::from("v")).is_match());
    /// assert!(!m.match_value(&Value::Int(12)).is_match());
    /// # Ok::<(), suma::PatternError>(())
    /// ```
    pub fn regex(expression: &str) -> Result<Self, PatternError> {
        let compiled = Regex::new(expression).map_err(|e| PatternError::InvalidRegex {
            pattern: expression.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::Regex(compiled))
    }

    /// A half-open numeric range leaf: matches numbers in `[min, max)`.
    #[must_use]
    pub fn range(min: f64, max: f64) -> Self {
        Self::Range { min, max }
    }

    /// A predicate leaf over alias bindings. See [`ConditionalMatcher`].
    pub fn conditional<F>(params: &[&str], func: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        Self::Conditional(ConditionalMatcher {
            params: params.iter().map(|p| (*p).to_string()).collect(),
            func: std::sync::Arc::new(func),
        })
    }

    /// A generator leaf over alias bindings. See [`GeneratorMatcher`].
    pub fn generator<F>(params: &[&str], func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::Generator(GeneratorMatcher {
            params: params.iter().map(|p| (*p).to_string()).collect(),
            func: std::sync::Arc::new(func),
        })
    }

    /// Bind the subject to `alias`, then apply this matcher to it.
    #[must_use]
    pub fn save_as(self, alias: impl Into<String>) -> Self {
        Self::Save {
            alias: alias.into(),
            inner: Box::new(self),
        }
    }

    /// Left-biased alternative with `other`.
    #[must_use]
    pub fn or(self, other: Matcher) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negate this matcher. A double negation collapses to the inner
    /// matcher at construction.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Capabilities
// ═══════════════════════════════════════════════════════════════════════

impl Matcher {
    /// Whether this matcher consumes a whole collection rather than a
    /// single element. Shape constraint evaluation feeds such matchers
    /// the full candidate list instead of fanning out per candidate.
    #[must_use]
    pub fn is_collection_matcher(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Whether this matcher is a sub-sequence wildcard. The sequence
    /// engine gives these variable-length spans.
    #[must_use]
    pub fn is_list_wildcard(&self) -> bool {
        matches!(self, Self::ListWildcard(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Evaluation
// ═══════════════════════════════════════════════════════════════════════

impl Matcher {
    /// Match a subject from a fresh context with default options.
    #[must_use]
    pub fn match_value(&self, subject: &Value) -> MatchResult {
        self.match_with(subject, MatchOptions::default())
    }

    /// Match a subject from a fresh context.
    #[must_use]
    pub fn match_with(&self, subject: &Value, options: MatchOptions) -> MatchResult {
        let outcomes = self.match_context(subject, Context::new());
        let mut contexts: Vec<Context> =
            outcomes.into_iter().filter(Context::is_match).collect();
        if options.strict_obligations {
            contexts.retain(|c| !c.has_pending_obligations());
        }
        MatchResult { contexts }
    }

    /// Match a subject under an existing hypothesis.
    ///
    /// Returns every explored hypothesis, failures included; callers
    /// filter on [`Context::is_match`]. Matchers that fan out (shapes,
    /// sequences, alternatives) clone the context per branch.
    pub fn match_context(&self, subject: &Value, mut context: Context) -> Vec<Context> {
        match self {
            Self::Literal(value) => {
                context.set_match(value == subject);
                vec![context]
            }
            Self::Identity(value) => {
                context.set_match(value.is_same(subject));
                vec![context]
            }
            Self::Wildcard(alias) | Self::ListWildcard(alias) => {
                if alias == ANONYMOUS {
                    context.set_match(true);
                } else {
                    let consistent = context.bind(alias, subject.clone());
                    context.set_match(consistent);
                }
                vec![context]
            }
            Self::Object(shape) => shape.match_context(subject, context),
            Self::Map(shape) => shape.match_context(subject, context),
            Self::Sequence(elements) => match subject {
                Value::Seq(items) => match_sequence(elements, items, context),
                _ => {
                    context.set_match(false);
                    vec![context]
                }
            },
            Self::Not(inner) => {
                let flipped = !context.truth();
                let saved = context.clone();
                let outcomes = inner.match_context(subject, context);
                if outcomes.is_empty() {
                    return vec![saved];
                }
                let mut kept: Vec<Context> = outcomes
                    .into_iter()
                    .filter(|c| c.is_match() == flipped)
                    .collect();
                for c in &mut kept {
                    c.set_match(!flipped);
                }
                kept
            }
            Self::Or(left, right) => {
                let saved = context.clone();
                let outcomes = left.match_context(subject, context);
                if outcomes.iter().any(Context::is_match) {
                    return outcomes;
                }
                right.match_context(subject, saved)
            }
            Self::Save { alias, inner } => {
                if context.bind(alias, subject.clone()) {
                    inner.match_context(subject, context)
                } else {
                    context.set_match(false);
                    vec![context]
                }
            }
            Self::Regex(expression) => {
                let matched = subject.as_str().is_some_and(|s| expression.is_match(s));
                context.set_match(matched);
                vec![context]
            }
            Self::Range { min, max } => {
                let matched = subject.as_f64().is_some_and(|n| n >= *min && n < *max);
                context.set_match(matched);
                vec![context]
            }
            Self::Conditional(leaf) => {
                let obligation = Obligation {
                    params: leaf.params.clone(),
                    op: DeferredOp::Test(leaf.func.clone()),
                    subject: subject.clone(),
                };
                if obligation.is_ready(context.bindings()) {
                    let verdict = context.discharge_now(&obligation);
                    context.set_match(verdict);
                } else {
                    context.defer(obligation);
                    context.set_match(true);
                }
                vec![context]
            }
            Self::Generator(leaf) => {
                let obligation = Obligation {
                    params: leaf.params.clone(),
                    op: DeferredOp::Produce(leaf.func.clone()),
                    subject: subject.clone(),
                };
                if obligation.is_ready(context.bindings()) {
                    let produced = (leaf.func)(&obligation.args(context.bindings()));
                    match as_matcher(&produced) {
                        Ok(matcher) => matcher.match_context(subject, context),
                        Err(_) => {
                            context.set_match(false);
                            vec![context]
                        }
                    }
                } else {
                    context.defer(obligation);
                    context.set_match(true);
                    vec![context]
                }
            }
        }
    }
}

/// Knobs for the matching entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Drop successful hypotheses that still carry obligations which never
    /// became dischargeable. The default (`false`) keeps them and reports
    /// the skipped obligations as diagnostics.
    pub strict_obligations: bool,
}

/// Outcome of a match attempt: the successful hypotheses.
///
/// # Example
///
/// ```
/// use suma::{Matcher, Value};
///
/// let pattern = Matcher::wildcard("x");
/// let result = pattern.match_value(&Value::Int(3));
/// assert!(result.is_match());
/// assert_eq!(result.bindings()[0]["x"], Value::Int(3));
/// ```
#[derive(Debug, Clone)]
pub struct MatchResult {
    contexts: Vec<Context>,
}

impl MatchResult {
    /// `true` when at least one hypothesis succeeded.
    #[must_use]
    pub fn is_match(&self) -> bool {
        !self.contexts.is_empty()
    }

    /// The successful hypotheses, in discovery order.
    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    /// Alias bindings of each successful hypothesis, in discovery order.
    #[must_use]
    pub fn bindings(&self) -> Vec<&std::collections::BTreeMap<String, Value>> {
        self.contexts.iter().map(Context::bindings).collect()
    }

    /// Obligations that were silently skipped because their parameters
    /// never all bound, across all successful hypotheses.
    #[must_use]
    pub fn skipped_obligations(&self) -> Vec<SkippedObligation> {
        self.contexts
            .iter()
            .flat_map(Context::skipped_obligations)
            .collect()
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.is_match())?;
        for context in &self.contexts {
            write!(f, " {:?}", context.bindings())?;
        }
        f.write_str(">")
    }
}
