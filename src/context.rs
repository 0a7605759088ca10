//! `Context` — Alias bindings threaded through a match attempt
//!
//! A context is one hypothesis about what the pattern's aliases stand for.
//! Matching is speculative: whenever a matcher explores alternatives it
//! clones the incoming context per branch, and each branch accumulates its
//! own bindings independently.
//!
//! Three pieces of state ride along with the bindings:
//!
//! - the current verdict (`is_match`), set by every matcher as it runs;
//! - the truth polarity, flipped inside negation so that inner matchers
//!   keep writing their verdicts naively;
//! - a queue of deferred obligations — predicate or generator leaves whose
//!   parameters were not yet bound when the leaf was reached. Every new
//!   binding sweeps the queue; a failing obligation poisons the context
//!   permanently.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::pattern::as_matcher;
use crate::value::Value;

/// Parameter name that receives the subject the leaf was applied to,
/// rather than an alias binding.
pub const SUBJECT_PARAM: &str = "self";

/// Signature of a deferred predicate: `true` keeps the context alive.
pub type PredicateFn = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Signature of a generator: produces a value that is converted to a
/// matcher and applied to the recorded subject.
pub type GeneratorFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
pub(crate) enum DeferredOp {
    Test(PredicateFn),
    Produce(GeneratorFn),
}

impl fmt::Debug for DeferredOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test(_) => f.write_str("Test"),
            Self::Produce(_) => f.write_str("Produce"),
        }
    }
}

/// A leaf evaluation postponed until its parameters are bound.
///
/// The subject the leaf was originally applied to is captured by value, so
/// the obligation can be discharged long after matching moved elsewhere.
#[derive(Debug, Clone)]
pub(crate) struct Obligation {
    pub params: Vec<String>,
    pub op: DeferredOp,
    pub subject: Value,
}

impl Obligation {
    /// Ready once every parameter except [`SUBJECT_PARAM`] is bound.
    pub fn is_ready(&self, bindings: &BTreeMap<String, Value>) -> bool {
        self.params
            .iter()
            .all(|p| p == SUBJECT_PARAM || bindings.contains_key(p))
    }

    /// Argument vector in parameter order. Unbound aliases resolve to
    /// `Null`; callers check readiness first when that matters.
    pub fn args(&self, bindings: &BTreeMap<String, Value>) -> Vec<Value> {
        self.params
            .iter()
            .map(|p| {
                if p == SUBJECT_PARAM {
                    self.subject.clone()
                } else {
                    bindings.get(p).cloned().unwrap_or_default()
                }
            })
            .collect()
    }

    /// Discharge against `context`. Returns `false` when the obligation
    /// fails, in which case the caller poisons the context.
    ///
    /// A generator obligation re-enters matching: the produced value is
    /// converted to a matcher and applied to the recorded subject on a
    /// scratch context, and the first succeeding branch's bindings are
    /// merged back (each merge re-checked for collisions). A generator
    /// that runs inline fans out over every succeeding branch; a deferred
    /// one collapses to the first, since by discharge time the context
    /// can no longer split. Obligations deferred inside the scratch
    /// evaluation are dropped with it.
    fn discharge(&self, context: &mut Context) -> bool {
        let args = self.args(&context.bindings);
        match &self.op {
            DeferredOp::Test(f) => f(&args),
            DeferredOp::Produce(f) => {
                let produced = f(&args);
                let Ok(matcher) = as_matcher(&produced) else {
                    return false;
                };
                let scratch = Context::branch(context.truth, context.bindings.clone());
                let outcomes = matcher.match_context(&self.subject, scratch);
                let Some(winner) = outcomes.into_iter().find(Context::is_match) else {
                    return false;
                };
                for (alias, value) in winner.bindings {
                    if !context.bind(&alias, value) {
                        return false;
                    }
                }
                true
            }
        }
    }
}

/// A record of an obligation that never became dischargeable.
///
/// Surfaced through [`MatchResult::skipped_obligations`](crate::MatchResult::skipped_obligations)
/// so callers can tell a clean success from one that silently dropped a
/// predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedObligation {
    /// The obligation's declared parameters.
    pub params: Vec<String>,
    /// The parameters that never received a binding.
    pub missing: Vec<String>,
}

impl fmt::Display for SkippedObligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "obligation over ({}) never resolved, missing: {}",
            self.params.join(", "),
            self.missing.join(", ")
        )
    }
}

/// One binding hypothesis: alias bindings, verdict, polarity, and pending
/// obligations.
///
/// Contexts are created by the engine; user code mostly reads them back
/// out of a [`MatchResult`](crate::MatchResult).
///
/// # Example
///
/// ```
/// use suma::{Context, Value};
///
/// let mut context = Context::new();
/// assert!(context.bind("x", 3.into()));
/// assert!(context.bind("x", 3.into()));
/// assert!(!context.bind("x", 4.into()));
/// assert_eq!(context.lookup("x"), Some(&Value::Int(3)));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    bindings: BTreeMap<String, Value>,
    truth: bool,
    state: bool,
    poisoned: bool,
    obligations: Vec<Obligation>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A fresh context: no bindings, positive polarity, matching so far.
    #[must_use]
    pub fn new() -> Self {
        Self::with_truth(true)
    }

    /// A fresh context with an explicit truth polarity.
    #[must_use]
    pub fn with_truth(truth: bool) -> Self {
        Self {
            bindings: BTreeMap::new(),
            truth,
            state: truth,
            poisoned: false,
            obligations: Vec::new(),
        }
    }

    /// Scratch context seeded with existing bindings.
    pub(crate) fn branch(truth: bool, bindings: BTreeMap<String, Value>) -> Self {
        Self {
            bindings,
            ..Self::with_truth(truth)
        }
    }

    /// The polarity verdicts are judged against.
    #[must_use]
    pub fn truth(&self) -> bool {
        self.truth
    }

    /// Whether this hypothesis currently counts as a success.
    ///
    /// A poisoned context never matches again.
    #[must_use]
    pub fn is_match(&self) -> bool {
        !self.poisoned && self.state == self.truth
    }

    /// Record a matcher verdict. No-op on a poisoned context.
    pub fn set_match(&mut self, matched: bool) {
        if !self.poisoned {
            self.state = matched;
        }
    }

    /// Permanently fail this hypothesis. Used when a discharged obligation
    /// reports failure: no later verdict may resurrect the context.
    pub fn poison(&mut self) {
        self.poisoned = true;
        self.state = !self.truth;
    }

    /// Bind `alias` to `value`.
    ///
    /// If the alias is already bound, this is a consistency check: the
    /// call succeeds only when the existing value equals the new one, and
    /// nothing is overwritten. A fresh binding triggers an obligation
    /// sweep; returns `false` if that sweep poisoned the context.
    pub fn bind(&mut self, alias: &str, value: Value) -> bool {
        if let Some(existing) = self.bindings.get(alias) {
            return *existing == value;
        }
        self.bindings.insert(alias.to_string(), value);
        self.sweep_obligations();
        !self.poisoned
    }

    /// Look up a bound alias.
    #[must_use]
    pub fn lookup(&self, alias: &str) -> Option<&Value> {
        self.bindings.get(alias)
    }

    /// All alias bindings, in alias order.
    #[must_use]
    pub fn bindings(&self) -> &BTreeMap<String, Value> {
        &self.bindings
    }

    /// Whether any obligations are still pending.
    #[must_use]
    pub fn has_pending_obligations(&self) -> bool {
        !self.obligations.is_empty()
    }

    /// Pending obligations that can no longer be discharged, as
    /// diagnostics.
    #[must_use]
    pub fn skipped_obligations(&self) -> Vec<SkippedObligation> {
        self.obligations
            .iter()
            .map(|ob| SkippedObligation {
                params: ob.params.clone(),
                missing: ob
                    .params
                    .iter()
                    .filter(|p| *p != SUBJECT_PARAM && !self.bindings.contains_key(*p))
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Queue an obligation for a later sweep.
    pub(crate) fn defer(&mut self, obligation: Obligation) {
        self.obligations.push(obligation);
    }

    /// Evaluate an already-ready obligation in place, poisoning on
    /// failure. Returns the verdict to record.
    pub(crate) fn discharge_now(&mut self, obligation: &Obligation) -> bool {
        let ok = obligation.discharge(self);
        if !ok {
            self.poison();
        }
        ok
    }

    /// Discharge every obligation whose parameters are now bound.
    /// Discharging a generator may bind new aliases, so the queue is
    /// re-scanned until it settles.
    fn sweep_obligations(&mut self) {
        while !self.poisoned {
            let Some(index) = self
                .obligations
                .iter()
                .position(|ob| ob.is_ready(&self.bindings))
            else {
                break;
            };
            let obligation = self.obligations.remove(index);
            if !obligation.discharge(self) {
                self.poison();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(params: &[&str], f: impl Fn(&[Value]) -> bool + Send + Sync + 'static) -> Obligation {
        Obligation {
            params: params.iter().map(|p| (*p).to_string()).collect(),
            op: DeferredOp::Test(Arc::new(f)),
            subject: Value::Null,
        }
    }

    #[test]
    fn rebinding_checks_equality() {
        let mut context = Context::new();
        assert!(context.bind("x", 3.into()));
        assert!(context.bind("x", Value::Float(3.0)));
        assert!(!context.bind("x", 4.into()));
        // The failed rebind left the original value alone.
        assert_eq!(context.lookup("x"), Some(&Value::Int(3)));
    }

    #[test]
    fn deferred_predicate_fires_on_bind() {
        let mut context = Context::new();
        context.defer(predicate(&["x"], |args| args[0] == Value::Int(8)));
        assert!(context.has_pending_obligations());

        assert!(context.bind("x", 8.into()));
        assert!(!context.has_pending_obligations());
        assert!(context.is_match());
    }

    #[test]
    fn failed_obligation_poisons_permanently() {
        let mut context = Context::new();
        context.defer(predicate(&["x"], |args| args[0] == Value::Int(8)));

        assert!(!context.bind("x", 9.into()));
        assert!(!context.is_match());

        // No later verdict can resurrect the hypothesis.
        context.set_match(true);
        assert!(!context.is_match());
    }

    #[test]
    fn subject_param_reads_recorded_subject() {
        let mut context = Context::new();
        let mut ob = predicate(&["self", "x"], |args| args[0] == args[1]);
        ob.subject = Value::Int(5);
        context.defer(ob);

        assert!(context.bind("x", 5.into()));
        assert!(context.is_match());
    }

    #[test]
    fn unresolved_obligation_reports_missing_params() {
        let mut context = Context::new();
        context.defer(predicate(&["x", "y"], |_| true));
        assert!(context.bind("x", 1.into()));

        let skipped = context.skipped_obligations();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].missing, vec!["y".to_string()]);
    }

    #[test]
    fn generator_obligation_merges_winner_bindings() {
        let mut context = Context::new();
        let ob = Obligation {
            params: vec!["x".to_string()],
            op: DeferredOp::Produce(Arc::new(|args| {
                // Produce a literal the subject must equal.
                args[0].clone()
            })),
            subject: Value::Int(7),
        };
        context.defer(ob);

        assert!(context.bind("x", 7.into()));
        assert!(context.is_match());

        let mut failing = Context::new();
        let ob = Obligation {
            params: vec!["x".to_string()],
            op: DeferredOp::Produce(Arc::new(|args| args[0].clone())),
            subject: Value::Int(7),
        };
        failing.defer(ob);
        assert!(!failing.bind("x", 8.into()));
        assert!(!failing.is_match());
    }

    #[test]
    fn context_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Context>();
        assert_send_sync::<SkippedObligation>();
    }
}
