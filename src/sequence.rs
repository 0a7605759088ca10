//! Sequence matching — backtracking alignment of patterns over sequences
//!
//! A sequence pattern is matched element-wise, except for list wildcards,
//! which absorb a variable-length span. The engine explores span
//! assignments with an explicit cursor instead of recursion: a pattern
//! position and a subject position move forward while elements match and
//! backward on failure, growing the nearest wildcard span by one on each
//! retreat. A trailing wildcard starts greedy (it takes the whole rest of
//! the subject); interior wildcards start empty and grow.
//!
//! Every full alignment is reported, not just the first: after a success
//! the cursor is pushed backward and the search resumes, so callers see
//! all alignments in greedy-then-shrinking, leftmost-first order.
//!
//! Binding hypotheses ride along per pattern position. Positions fan out
//! (an element matcher may split one hypothesis into several), so the
//! cursor keeps a bucket of surviving contexts per position and re-seeds
//! each step from the previous position's bucket.

use crate::context::Context;
use crate::matcher::Matcher;
use crate::value::Value;

/// Backtracking state: cursor positions, per-wildcard span bookkeeping,
/// and per-position context buckets.
struct Cursor {
    subject_size: isize,
    pattern_size: isize,
    // Variable-length span per position; only wildcard slots are used.
    span_starts: Vec<usize>,
    span_lengths: Vec<usize>,
    span_min: Vec<usize>,
    span_max: Vec<isize>,
    subject_cursor: isize,
    pattern_cursor: isize,
    has_next: bool,
    forward: bool,
    original: Context,
    contexts: Vec<Vec<Context>>,
    // Per-position retry flag: a position already consumed forward must
    // not re-consume the same element while backtracking through it.
    retry: Vec<bool>,
}

impl Cursor {
    fn new(pattern: &[Matcher], subject_size: usize, original: Context) -> Self {
        let pattern_size = pattern.len();
        let wildcard_count = pattern.iter().filter(|m| m.is_list_wildcard()).count();
        let fixed_count = pattern_size - wildcard_count;

        let mut cursor = Self {
            subject_size: subject_size as isize,
            pattern_size: pattern_size as isize,
            span_starts: vec![0; pattern_size],
            span_lengths: vec![0; pattern_size],
            span_min: vec![0; pattern_size],
            span_max: vec![0; pattern_size],
            subject_cursor: 0,
            pattern_cursor: 0,
            has_next: true,
            forward: true,
            original,
            contexts: vec![Vec::new(); pattern_size],
            retry: vec![true; pattern_size],
        };
        for (i, element) in pattern.iter().enumerate() {
            if element.is_list_wildcard() {
                cursor.span_max[i] = subject_size as isize - fixed_count as isize;
            }
        }
        cursor
    }

    /// Hypotheses feeding the current position: the previous position's
    /// survivors, or the original context at the start.
    fn contexts_for_current_pattern(&self) -> Vec<Context> {
        let index = self.pattern_cursor - 1;
        if index < 0 {
            vec![self.original.clone()]
        } else {
            self.contexts[index as usize].clone()
        }
    }

    fn add_contexts(&mut self, contexts: Vec<Context>) {
        self.contexts[self.pattern_cursor as usize].extend(contexts);
    }

    fn clear_contexts_for_current_pattern(&mut self) {
        let index = self.pattern_cursor;
        if (0..self.pattern_size).contains(&index) {
            self.contexts[index as usize].clear();
        }
    }
}

/// Enumerate every alignment of `pattern` over `subject`, reporting the
/// surviving hypotheses of each. An empty return means no alignment.
pub(crate) fn match_sequence(
    pattern: &[Matcher],
    subject: &[Value],
    context: Context,
) -> Vec<Context> {
    let mut results = Vec::new();
    let mut cursor = Cursor::new(pattern, subject.len(), context);
    while cursor.has_next {
        let mut found = false;
        while !found && cursor.has_next {
            found = match_next(pattern, subject, &mut cursor);
        }
        if found {
            results.extend(cursor.contexts_for_current_pattern());
            cursor.forward = false;
        }
    }
    results
}

/// One cursor step. Returns `true` when a full alignment was just
/// completed; the cursor is then positioned for span extraction and for
/// resuming the search.
fn match_next(pattern: &[Matcher], subject: &[Value], cursor: &mut Cursor) -> bool {
    // Snapshot before any cursor adjustment: the seed hypotheses belong
    // to the entry position, not the position after backtracking.
    let seeds = cursor.contexts_for_current_pattern();

    if cursor.forward {
        if cursor.pattern_cursor >= cursor.pattern_size {
            if cursor.subject_cursor >= cursor.subject_size {
                return true;
            }
            // Pattern exhausted with subject left over: back into the
            // last position.
            cursor.forward = false;
            cursor.pattern_cursor -= 1;
            cursor.clear_contexts_for_current_pattern();
        }
    } else if cursor.pattern_cursor >= cursor.pattern_size {
        cursor.pattern_cursor -= 1;
        cursor.subject_cursor -= 1;
    }
    if cursor.pattern_cursor < 0 || cursor.subject_cursor < 0 {
        cursor.has_next = false;
        return false;
    }

    let position = cursor.pattern_cursor as usize;
    let element = &pattern[position];

    if !element.is_list_wildcard() {
        if cursor.forward && cursor.subject_cursor < cursor.subject_size {
            cursor.retry[position] = true;
            cursor.clear_contexts_for_current_pattern();
            let outcomes: Vec<Context> = seeds
                .into_iter()
                .flat_map(|c| element.match_context(&subject[cursor.subject_cursor as usize], c))
                .collect();
            if outcomes.iter().any(Context::is_match) {
                // Consumed forward; backtracking through this position
                // must retreat rather than re-consume the same element.
                cursor.retry[position] = false;
                cursor.add_contexts(outcomes.into_iter().filter(Context::is_match).collect());
                cursor.pattern_cursor += 1;
                cursor.subject_cursor += 1;
            } else {
                cursor.pattern_cursor -= 1;
                cursor.forward = false;
            }
        } else if cursor.subject_cursor < cursor.subject_size {
            let outcomes: Vec<Context> = seeds
                .into_iter()
                .flat_map(|c| element.match_context(&subject[cursor.subject_cursor as usize], c))
                .collect();
            if cursor.retry[position] && outcomes.iter().any(Context::is_match) {
                cursor.retry[position] = true;
                cursor.add_contexts(outcomes.into_iter().filter(Context::is_match).collect());
                cursor.pattern_cursor += 1;
                cursor.subject_cursor += 1;
                cursor.forward = true;
            } else {
                cursor.pattern_cursor -= 1;
                cursor.subject_cursor -= 1;
                cursor.forward = false;
            }
        } else {
            cursor.pattern_cursor -= 1;
            cursor.subject_cursor -= 1;
            cursor.forward = false;
        }
    } else {
        if cursor.forward {
            cursor.span_starts[position] = cursor.subject_cursor as usize;
            if cursor.pattern_cursor == cursor.pattern_size - 1 {
                // Trailing wildcard starts greedy: take everything left.
                cursor.span_lengths[position] =
                    (cursor.subject_size - cursor.subject_cursor).max(0) as usize;
            } else {
                cursor.span_lengths[position] = cursor.span_min[position];
            }
        } else {
            cursor.span_lengths[position] += 1;
            cursor.forward = true;
            cursor.clear_contexts_for_current_pattern();
        }
        let length = cursor.span_lengths[position];
        let start = cursor.span_starts[position];

        if length as isize > cursor.span_max[position]
            || (start + length) as isize >= cursor.subject_size + 1
        {
            // Span exhausted: rewind the subject to the span start and
            // back into the previous position.
            cursor.subject_cursor = start as isize;
            cursor.forward = false;
            cursor.span_lengths[position] = 0;
            cursor.pattern_cursor -= 1;
            cursor.clear_contexts_for_current_pattern();
        } else {
            let span = Value::from(subject[start..start + length].to_vec());
            let outcomes: Vec<Context> = seeds
                .into_iter()
                .flat_map(|c| element.match_context(&span, c))
                .collect();
            if outcomes.iter().any(Context::is_match) {
                cursor.add_contexts(outcomes.into_iter().filter(Context::is_match).collect());
                cursor.pattern_cursor += 1;
                cursor.subject_cursor = (start + length) as isize;
            } else {
                cursor.forward = false;
                cursor.span_lengths[position] = 0;
                cursor.pattern_cursor -= 1;
            }
        }
    }
    false
}
