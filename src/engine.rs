//! The match engine: given a request and a pool of candidate spans,
//! find the best match by walking the four priority rungs in order
//! and breaking ties deterministically (spec §4.4).

use tracing::{debug, instrument};

use crate::config::MatcherConfig;
use crate::error::MatchError;
use crate::normalize;
use crate::schema::{reduce, reduced_value_hash};
use crate::store::SpanStore;
use crate::types::{GetMockRequest, MatchLevel, MatchScope, MatchType, Span};

/// A request paired with the hashes it will be compared against,
/// computed once up front rather than per candidate.
struct RequestRungs<'a> {
    request: &'a GetMockRequest,
    input_value_hash: String,
    input_schema_hash: Option<String>,
}

impl<'a> RequestRungs<'a> {
    fn compute(request: &'a GetMockRequest) -> Self {
        RequestRungs {
            request,
            input_value_hash: crate::hash::hash_value(&request.input_value),
            input_schema_hash: request.input_schema.as_ref().map(|schema| {
                let as_value = serde_json::to_value(schema).expect("Schema serialises to JSON");
                crate::hash::hash_value(&as_value)
            }),
        }
    }
}

/// Does `candidate` match `rungs.request` at `rung`? Package name must
/// always agree; `candidate` is otherwise filtered only by the rung's
/// own comparison, per spec §4.4.1.
fn matches_at_rung(candidate: &Span, rungs: &RequestRungs<'_>, rung: MatchType) -> bool {
    if candidate.package_name != rungs.request.package_name {
        return false;
    }

    match rung {
        MatchType::InputValueHash => {
            candidate.input_value_hash.as_deref() == Some(rungs.input_value_hash.as_str())
        }

        MatchType::InputValueHashReducedSchema => {
            // The schema used to reduce both sides is whichever side
            // has one; when both have one, their (unreduced) hashes
            // must agree for this rung to apply at all.
            let effective_schema = match (&candidate.input_schema, &rungs.request.input_schema) {
                (Some(candidate_schema), Some(request_schema)) => {
                    if candidate.input_schema_hash.as_deref() != rungs.input_schema_hash.as_deref() {
                        return false;
                    }
                    let _ = request_schema;
                    Some(candidate_schema)
                }
                (Some(schema), None) | (None, Some(schema)) => Some(schema),
                (None, None) => None,
            };
            let Some(schema) = effective_schema else {
                return false;
            };
            reduced_value_hash(&candidate.input_value, Some(schema))
                == reduced_value_hash(&rungs.request.input_value, Some(schema))
        }

        MatchType::InputSchemaHash => {
            let hash_matches = match (&candidate.input_schema_hash, &rungs.input_schema_hash) {
                (Some(candidate_hash), Some(request_hash)) => candidate_hash == request_hash,
                _ => false,
            };
            hash_matches && shapes_match(candidate, rungs.request)
        }

        MatchType::InputSchemaHashReducedSchema => {
            let hash_matches = match (&candidate.input_schema, &rungs.request.input_schema) {
                (Some(candidate_schema), Some(request_schema)) => {
                    crate::schema::reduced_schema_hash(candidate_schema)
                        == crate::schema::reduced_schema_hash(request_schema)
                }
                _ => false,
            };
            hash_matches && shapes_match(candidate, rungs.request)
        }
    }
}

/// Protocol shape equality on top of a schema-hash match (spec §4.3).
/// Packages with no registered comparator pass by default — schema
/// hash equality alone is sufficient for them.
fn shapes_match(candidate: &Span, request: &GetMockRequest) -> bool {
    match normalize::comparator_for(&candidate.package_name) {
        Some(comparator) => {
            let candidate_value = match &candidate.input_schema {
                Some(schema) => reduce(&candidate.input_value, Some(schema)),
                None => candidate.input_value.clone(),
            };
            let request_value = match &request.input_schema {
                Some(schema) => reduce(&request.input_value, Some(schema)),
                None => request.input_value.clone(),
            };
            comparator.shapes_match(&candidate_value, &request_value)
        }
        None => true,
    }
}

/// Pick the best candidate among spans that all matched at the same
/// rung: prefer an unused span over a used one, then the oldest
/// timestamp, then lexicographically smallest span id as a final,
/// fully deterministic tiebreak.
fn select_best<'a>(candidates: &[&'a Span], store: &SpanStore) -> &'a Span {
    candidates
        .iter()
        .copied()
        .min_by_key(|span| {
            let used = store.is_used(&span.trace_id, &span.span_id);
            (used, span.timestamp, span.span_id.clone())
        })
        .expect("select_best called with a non-empty slice")
}

/// Walk the four rungs in order against `pool`, returning the first
/// rung with at least one match and the best candidate within it.
fn search_pool<'a>(
    pool: &'a [Span],
    rungs: &RequestRungs<'_>,
    store: &SpanStore,
) -> Option<(&'a Span, MatchType)> {
    for rung in MatchType::RUNGS {
        let matching: Vec<&Span> = pool
            .iter()
            .filter(|candidate| matches_at_rung(candidate, rungs, rung))
            .collect();
        if !matching.is_empty() {
            return Some((select_best(&matching, store), rung));
        }
    }
    None
}

/// Find the best match among spans recorded for `request.trace_id`
/// only (spec §4.4.1). Returns `Ok(None)` on a clean miss — a miss is
/// not an error.
#[instrument(skip(store, request), fields(trace_id = %request.trace_id, package_name = %request.package_name))]
pub fn find_best_match_in_trace(
    store: &SpanStore,
    request: &GetMockRequest,
) -> Result<Option<(Span, MatchLevel)>, MatchError> {
    let rungs = RequestRungs::compute(request);
    let pool = store.trace_spans(&request.trace_id);
    let Some((span, match_type)) = search_pool(&pool, &rungs, store) else {
        debug!("no trace-scoped match");
        return Ok(None);
    };
    store.mark_used(&span.trace_id, &span.span_id);
    Ok(Some((
        span.clone(),
        MatchLevel {
            match_type,
            scope: MatchScope::Trace,
        },
    )))
}

/// Find the best match among a caller-supplied pool — typically the
/// suite or global span collection (spec §4.4.2). Usage is still
/// tracked per the span's *originating* trace, and a hit is always
/// reported at `MatchScope::Global`.
#[instrument(skip(store, request, pool), fields(package_name = %request.package_name))]
pub fn find_best_match_across_traces(
    store: &SpanStore,
    request: &GetMockRequest,
    pool: &[Span],
) -> Result<Option<(Span, MatchLevel)>, MatchError> {
    let rungs = RequestRungs::compute(request);
    let Some((span, match_type)) = search_pool(pool, &rungs, store) else {
        debug!("no cross-trace match");
        return Ok(None);
    };
    store.mark_used(&span.trace_id, &span.span_id);
    Ok(Some((
        span.clone(),
        MatchLevel {
            match_type,
            scope: MatchScope::Global,
        },
    )))
}

/// The entry point the RPC transport calls for every outbound call
/// (spec §4.4.3): try the requesting trace first, then widen to
/// suite/global scope per the cascade rule.
///
/// Suite scope is consulted when the trace id is empty, the request
/// is pre-app-start, or a non-empty-trace search missed and
/// `config.allow_suite_wide_matching` is true. Global scope is always
/// tried afterward for a still-unmatched pre-app-start request.
#[instrument(skip(store, config, request), fields(trace_id = %request.trace_id, package_name = %request.package_name))]
pub fn find_best_match_with_trace_priority(
    store: &SpanStore,
    config: &MatcherConfig,
    request: &GetMockRequest,
) -> Result<Option<(Span, MatchLevel)>, MatchError> {
    if !request.trace_id.is_empty() {
        if let Some(found) = find_best_match_in_trace(store, request)? {
            return Ok(Some(found));
        }
    }

    let trace_missed = !request.trace_id.is_empty();
    let reaches_suite = request.trace_id.is_empty()
        || request.is_pre_app_start
        || (trace_missed && config.allow_suite_wide_matching);

    if reaches_suite {
        let suite_pool = store.suite_spans();
        if let Some(found) = find_best_match_across_traces(store, request, &suite_pool)? {
            return Ok(Some(found));
        }
    }

    if request.is_pre_app_start {
        let global_pool = store.global_spans();
        if let Some(found) = find_best_match_across_traces(store, request, &global_pool)? {
            return Ok(Some(found));
        }
    }

    debug!("no match at any scope");
    Ok(None)
}
