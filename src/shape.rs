//! Shape matchers — keyed constraints over objects and maps
//!
//! A shape pairs navigation paths with sub-matchers. Constraints are
//! evaluated in declaration order as a pipeline over binding hypotheses:
//! each constraint resolves its path, fans the surviving hypotheses out
//! over the candidates, and keeps only the successes. One failing
//! constraint therefore empties the pipeline and short-circuits the rest.
//!
//! A path constrained by a collection matcher (a sequence pattern) is fed
//! the whole resolved candidate list as one subject instead of fanning
//! out per candidate.

use crate::context::Context;
use crate::matcher::Matcher;
use crate::path::Path;
use crate::value::Value;
use crate::PatternError;

/// Constraints keyed by parsed paths, in declaration order.
#[derive(Debug, Clone)]
pub(crate) struct Constraints(Vec<(Path, Matcher)>);

impl Constraints {
    fn parse(entries: Vec<(&str, Matcher)>, dictkey: bool) -> Result<Self, PatternError> {
        let mut parsed = Vec::with_capacity(entries.len());
        for (expression, matcher) in entries {
            parsed.push((Path::parse(expression, dictkey)?, matcher));
        }
        Ok(Self(parsed))
    }

    /// Run the constraint pipeline against `subject`, starting from one
    /// hypothesis. Returns only surviving (matching) hypotheses.
    fn match_context(&self, subject: &Value, mut context: Context) -> Vec<Context> {
        context.set_match(true);
        let mut survivors = vec![context];
        for (path, matcher) in &self.0 {
            let mut produced = Vec::new();
            for hypothesis in &survivors {
                if matcher.is_collection_matcher() {
                    let candidates = Value::from(path.resolve_from(subject));
                    produced.extend(matcher.match_context(&candidates, hypothesis.clone()));
                } else {
                    for candidate in path.resolve_from(subject) {
                        produced.extend(matcher.match_context(&candidate, hypothesis.clone()));
                    }
                }
            }
            survivors = produced.into_iter().filter(Context::is_match).collect();
            if survivors.is_empty() {
                break;
            }
        }
        survivors
    }
}

/// The structural part of [`Matcher::Object`](crate::Matcher::Object):
/// a type gate plus keyed constraints.
///
/// Built through [`Matcher::object_shape`](crate::Matcher::object_shape)
/// and [`Matcher::object_shape_subtypes`](crate::Matcher::object_shape_subtypes).
#[derive(Debug, Clone)]
pub struct ObjectShape {
    class: String,
    constraints: Constraints,
    subclass_match: bool,
}

impl ObjectShape {
    pub(crate) fn new(
        class: impl Into<String>,
        constraints: Vec<(&str, Matcher)>,
        subclass_match: bool,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            class: class.into(),
            constraints: Constraints::parse(constraints, false)?,
            subclass_match,
        })
    }

    /// The declared type name.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    pub(crate) fn match_context(&self, subject: &Value, mut context: Context) -> Vec<Context> {
        let sametype = if self.subclass_match {
            match subject {
                Value::Object(node) => node.has_type(&self.class),
                other => other.type_name() == self.class,
            }
        } else {
            subject.type_name() == self.class
        };
        if !sametype {
            context.set_match(false);
            return vec![context];
        }
        self.constraints.match_context(subject, context)
    }
}

/// The structural part of [`Matcher::Map`](crate::Matcher::Map): keyed
/// constraints with no type gate. A shape with no constraints matches
/// anything.
#[derive(Debug, Clone)]
pub struct MapShape {
    constraints: Constraints,
}

impl MapShape {
    pub(crate) fn new(constraints: Vec<(&str, Matcher)>) -> Result<Self, PatternError> {
        Ok(Self {
            constraints: Constraints::parse(constraints, true)?,
        })
    }

    pub(crate) fn match_context(&self, subject: &Value, context: Context) -> Vec<Context> {
        self.constraints.match_context(subject, context)
    }
}
