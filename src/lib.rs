//! Selection engine and span repository for a record-and-replay mock
//! matcher.
//!
//! A prior run against real dependencies is recorded as a set of
//! [`types::Span`]s — one per inbound request or outbound call. On
//! replay, this crate answers "given this outbound call, which
//! recorded span should stand in for the real dependency?" by walking
//! a fixed ladder of increasingly permissive comparisons
//! ([`types::MatchType::RUNGS`]) until one produces at least one
//! candidate, then breaking ties deterministically.
//!
//! ```
//! use mockmatcher::config::MatcherConfig;
//! use mockmatcher::engine::find_best_match_with_trace_priority;
//! use mockmatcher::store::SpanStore;
//! use mockmatcher::types::{GetMockRequest, Span};
//! use serde_json::json;
//!
//! let store = SpanStore::new();
//! store.load_spans_for_trace(
//!     "trace-1",
//!     vec![Span {
//!         trace_id: "trace-1".into(),
//!         span_id: "span-1".into(),
//!         is_pre_app_start: false,
//!         timestamp: 0,
//!         package_name: "http".into(),
//!         submodule_name: None,
//!         name: None,
//!         input_value: json!({"path": "/users/1"}),
//!         input_schema: None,
//!         input_value_hash: None,
//!         input_schema_hash: None,
//!         output_value: Some(json!({"id": 1})),
//!         output_schema: None,
//!         status: Some(200),
//!         duration: Some(12),
//!     }],
//! );
//!
//! let request = GetMockRequest {
//!     trace_id: "trace-1".into(),
//!     is_pre_app_start: false,
//!     package_name: "http".into(),
//!     submodule_name: None,
//!     name: None,
//!     input_value: json!({"path": "/users/1"}),
//!     input_schema: None,
//! };
//!
//! let config = MatcherConfig::default();
//! let result = find_best_match_with_trace_priority(&store, &config, &request).unwrap();
//! assert!(result.is_some());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod hash;
pub mod logging;
pub mod normalize;
pub mod schema;
pub mod store;
pub mod types;
