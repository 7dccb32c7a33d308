//! The data model: [`Span`], [`MatchLevel`], [`MatchType`], [`MatchScope`],
//! and the lookup request shape (spec §3).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// A recorded call, either an inbound request ("trigger") or an
/// outbound dependency call ("mock"), captured during a prior run.
///
/// Hash fields are `Option` because they may not have been computed
/// yet when a span is first deserialised off the wire — [`crate::store::SpanStore`]
/// backfills them on load per spec §3's invariant that every stored
/// span carries both hashes before it becomes a match candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,

    #[serde(default)]
    pub is_pre_app_start: bool,

    /// Epoch milliseconds. Used only to break ties between otherwise
    /// equally-ranked candidates (oldest first).
    pub timestamp: i64,

    pub package_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodule_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub input_value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_value_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl Span {
    /// Fill in `input_value_hash`/`input_schema_hash` from
    /// `input_value`/`input_schema` if they are absent. Idempotent:
    /// calling this twice on the same span produces the same hashes,
    /// since hashing is a pure function of already-present fields.
    pub fn backfill_hashes(&mut self) {
        if self.input_value_hash.is_none() {
            self.input_value_hash = Some(crate::hash::hash_value(&self.input_value));
        }
        if self.input_schema_hash.is_none() {
            if let Some(schema) = &self.input_schema {
                let as_value = serde_json::to_value(schema).expect("Schema serialises to JSON");
                self.input_schema_hash = Some(crate::hash::hash_value(&as_value));
            }
        }
    }
}

/// The four priority rungs the match engine walks in order, strongest
/// match first (spec §4.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    /// Exact match on `input_value_hash`.
    InputValueHash,
    /// Match on `reducedValueHash(v, schema)` using a schema shared by
    /// both sides.
    InputValueHashReducedSchema,
    /// Exact match on `input_schema_hash`, plus protocol shape equality.
    InputSchemaHash,
    /// Match on `reducedSchemaHash(schema)`, plus protocol shape equality.
    InputSchemaHashReducedSchema,
}

impl MatchType {
    /// The rungs in search order, strongest first.
    pub const RUNGS: [MatchType; 4] = [
        MatchType::InputValueHash,
        MatchType::InputValueHashReducedSchema,
        MatchType::InputSchemaHash,
        MatchType::InputSchemaHashReducedSchema,
    ];
}

/// Which collection of spans a match was found in. A match made
/// outside the requesting trace — whether found in the suite pool or
/// the global pool — is reported as `Global` (spec §4.4.2/§3): the two
/// pools differ in when they're consulted, not in how a hit is
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchScope {
    Trace,
    Global,
}

/// The rung and scope a successful match was found at, reported back
/// to callers for observability (spec §3, `MatchLevel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLevel {
    pub match_type: MatchType,
    pub scope: MatchScope,
}

/// A lookup against the store: "find me a recorded mock for this
/// outbound call, within this trace if possible." Shape mirrors a
/// recorded [`Span`] minus the response fields a request doesn't have
/// yet (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMockRequest {
    pub trace_id: String,

    #[serde(default)]
    pub is_pre_app_start: bool,

    pub package_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodule_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub input_value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Schema>,
}
