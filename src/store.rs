//! The span store: recorded spans organised by trace, suite, and
//! global scope, with per-trace usage tracking so concurrent matches
//! against different traces never contend on the same lock.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::Span;

/// All recorded spans available to the match engine, plus the
/// "has this span already been used as a match" bookkeeping needed
/// for the unused-before-used tie-break (spec §4.4).
///
/// Usage is tracked per trace id behind its own `RwLock`, rather than
/// one lock guarding the whole store, so a match running against
/// trace A never blocks a concurrent match running against trace B.
#[derive(Default)]
pub struct SpanStore {
    by_trace: RwLock<HashMap<String, Vec<Span>>>,
    suite_spans: RwLock<Vec<Span>>,
    global_spans: RwLock<Vec<Span>>,
    usage: RwLock<HashMap<String, RwLock<HashMap<String, bool>>>>,
}

impl SpanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (replace) the spans recorded for a single trace, backfilling
    /// missing hashes and resetting usage tracking for that trace.
    pub fn load_spans_for_trace(&self, trace_id: &str, mut spans: Vec<Span>) {
        for span in &mut spans {
            span.backfill_hashes();
        }
        self.by_trace
            .write()
            .expect("span store lock poisoned")
            .insert(trace_id.to_string(), spans);
        self.usage
            .write()
            .expect("span store lock poisoned")
            .insert(trace_id.to_string(), RwLock::new(HashMap::new()));
    }

    /// Load (replace) the suite-wide span pool — spans recorded
    /// before an app start, shared across every trace in a suite run.
    pub fn set_suite_spans(&self, mut spans: Vec<Span>) {
        for span in &mut spans {
            span.backfill_hashes();
        }
        *self.suite_spans.write().expect("span store lock poisoned") = spans;
    }

    /// Load (replace) the global span pool — the fallback scope
    /// outside any single suite.
    pub fn set_global_spans(&self, mut spans: Vec<Span>) {
        for span in &mut spans {
            span.backfill_hashes();
        }
        *self.global_spans.write().expect("span store lock poisoned") = spans;
    }

    /// Snapshot the spans recorded for `trace_id`, empty if none.
    pub fn trace_spans(&self, trace_id: &str) -> Vec<Span> {
        self.by_trace
            .read()
            .expect("span store lock poisoned")
            .get(trace_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn suite_spans(&self) -> Vec<Span> {
        self.suite_spans.read().expect("span store lock poisoned").clone()
    }

    pub fn global_spans(&self) -> Vec<Span> {
        self.global_spans.read().expect("span store lock poisoned").clone()
    }

    /// Whether `span_id` within `trace_id` has already been consumed
    /// as a match. A span id never recorded as used is "unused".
    pub fn is_used(&self, trace_id: &str, span_id: &str) -> bool {
        let usage = self.usage.read().expect("span store lock poisoned");
        let Some(per_trace) = usage.get(trace_id) else {
            return false;
        };
        per_trace
            .read()
            .expect("span store lock poisoned")
            .get(span_id)
            .copied()
            .unwrap_or(false)
    }

    /// Mark a span as used. Idempotent: marking an already-used span
    /// used again is a no-op observable from the outside.
    pub fn mark_used(&self, trace_id: &str, span_id: &str) {
        let usage = self.usage.read().expect("span store lock poisoned");
        if let Some(per_trace) = usage.get(trace_id) {
            per_trace
                .write()
                .expect("span store lock poisoned")
                .insert(span_id.to_string(), true);
            return;
        }
        drop(usage);
        let mut usage = self.usage.write().expect("span store lock poisoned");
        let per_trace = usage
            .entry(trace_id.to_string())
            .or_insert_with(|| RwLock::new(HashMap::new()));
        per_trace
            .write()
            .expect("span store lock poisoned")
            .insert(span_id.to_string(), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn span(trace_id: &str, span_id: &str, timestamp: i64) -> Span {
        Span {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            is_pre_app_start: false,
            timestamp,
            package_name: "http".into(),
            submodule_name: None,
            name: None,
            input_value: json!({"path": "/a"}),
            input_schema: None,
            input_value_hash: None,
            input_schema_hash: None,
            output_value: None,
            output_schema: None,
            status: None,
            duration: None,
        }
    }

    #[test]
    fn loading_backfills_hashes() {
        let store = SpanStore::new();
        store.load_spans_for_trace("t1", vec![span("t1", "s1", 0)]);
        let spans = store.trace_spans("t1");
        assert!(spans[0].input_value_hash.is_some());
    }

    #[test]
    fn new_trace_spans_are_unused() {
        let store = SpanStore::new();
        store.load_spans_for_trace("t1", vec![span("t1", "s1", 0)]);
        assert!(!store.is_used("t1", "s1"));
    }

    #[test]
    fn marking_used_is_idempotent() {
        let store = SpanStore::new();
        store.load_spans_for_trace("t1", vec![span("t1", "s1", 0)]);
        store.mark_used("t1", "s1");
        store.mark_used("t1", "s1");
        assert!(store.is_used("t1", "s1"));
    }

    #[test]
    fn usage_is_isolated_per_trace() {
        let store = SpanStore::new();
        store.load_spans_for_trace("t1", vec![span("t1", "s1", 0)]);
        store.load_spans_for_trace("t2", vec![span("t2", "s1", 0)]);
        store.mark_used("t1", "s1");
        assert!(store.is_used("t1", "s1"));
        assert!(!store.is_used("t2", "s1"));
    }

    #[test]
    fn reloading_a_trace_resets_its_usage() {
        let store = SpanStore::new();
        store.load_spans_for_trace("t1", vec![span("t1", "s1", 0)]);
        store.mark_used("t1", "s1");
        store.load_spans_for_trace("t1", vec![span("t1", "s1", 0)]);
        assert!(!store.is_used("t1", "s1"));
    }
}
