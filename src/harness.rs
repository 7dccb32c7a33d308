//! The eval harness (spec §4.5, §6): load a JSON scenario file, run
//! every example through the match engine against its own span pools,
//! and report pass/fail counts grouped by tag.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;
use crate::engine::find_best_match_with_trace_priority;
use crate::store::SpanStore;
use crate::types::{GetMockRequest, MatchScope, MatchType, Span};

/// What a single request within an example expects the engine to
/// return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expected {
    pub matched_span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_scope: Option<MatchScope>,
}

/// One request/expectation pair within an example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCase {
    pub request: GetMockRequest,
    pub expected: Expected,
}

/// One scenario example: its own span pools, its own matcher config,
/// and a sequence of requests run against them in order. Requests
/// within one example share a store, so later requests see the usage
/// effects of earlier ones — exactly what the unused-before-used
/// scenarios in spec §8 exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioExample {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub config: MatcherConfig,
    #[serde(default)]
    pub trace_mocks: Vec<Span>,
    #[serde(default)]
    pub suite_mocks: Vec<Span>,
    #[serde(default)]
    pub global_mocks: Vec<Span>,
    pub requests: Vec<RequestCase>,
}

/// A complete scenario file (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub examples: Vec<ScenarioExample>,
}

/// The outcome of running a single request within an example.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleOutcome {
    pub example_id: String,
    pub tags: Vec<String>,
    pub passed: bool,
    pub detail: String,
}

/// Aggregate results of running a [`ScenarioFile`].
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<ExampleOutcome>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Pass/fail counts grouped by tag, untagged outcomes under `"untagged"`.
    pub fn by_tag(&self) -> BTreeMap<String, (usize, usize)> {
        let mut grouped: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for outcome in &self.outcomes {
            let tags: Vec<&str> = if outcome.tags.is_empty() {
                vec!["untagged"]
            } else {
                outcome.tags.iter().map(String::as_str).collect()
            };
            for tag in tags {
                let entry = grouped.entry(tag.to_string()).or_default();
                if outcome.passed {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }
        grouped
    }
}

fn group_by_trace(spans: Vec<Span>) -> BTreeMap<String, Vec<Span>> {
    let mut grouped: BTreeMap<String, Vec<Span>> = BTreeMap::new();
    for span in spans {
        grouped.entry(span.trace_id.clone()).or_default().push(span);
    }
    grouped
}

fn run_request(store: &SpanStore, config: &MatcherConfig, case: &RequestCase) -> (bool, String) {
    match find_best_match_with_trace_priority(store, config, &case.request) {
        Ok(Some((span, level))) => {
            let matches_expected = case.expected.matched_span_id.as_deref() == Some(span.span_id.as_str())
                && case
                    .expected
                    .match_type
                    .is_none_or(|expected| expected == level.match_type)
                && case
                    .expected
                    .match_scope
                    .is_none_or(|expected| expected == level.scope);
            (
                matches_expected,
                format!(
                    "matched spanId={} matchType={:?} matchScope={:?}",
                    span.span_id, level.match_type, level.scope
                ),
            )
        }
        Ok(None) => (case.expected.matched_span_id.is_none(), "no match".to_string()),
        Err(err) => (false, format!("error: {err}")),
    }
}

fn run_example(example: &ScenarioExample) -> Vec<ExampleOutcome> {
    let store = SpanStore::new();
    for (trace_id, spans) in group_by_trace(example.trace_mocks.clone()) {
        store.load_spans_for_trace(&trace_id, spans);
    }
    store.set_suite_spans(example.suite_mocks.clone());
    store.set_global_spans(example.global_mocks.clone());

    example
        .requests
        .iter()
        .map(|case| {
            let (passed, detail) = run_request(&store, &example.config, case);
            ExampleOutcome {
                example_id: example.id.clone(),
                tags: example.tags.clone(),
                passed,
                detail,
            }
        })
        .collect()
}

/// Run every example in `scenario`, each against its own fresh store.
pub fn run_scenario(scenario: &ScenarioFile) -> RunReport {
    RunReport {
        outcomes: scenario.examples.iter().flat_map(run_example).collect(),
    }
}

/// Load a scenario from a JSON file and run it.
pub fn run_file(path: &Path) -> Result<RunReport, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    let scenario: ScenarioFile = serde_json::from_str(&text)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    Ok(run_scenario(&scenario))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn span(trace_id: &str, span_id: &str, input_value: serde_json::Value) -> Span {
        Span {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            is_pre_app_start: false,
            timestamp: 0,
            package_name: "http".into(),
            submodule_name: None,
            name: None,
            input_value,
            input_schema: None,
            input_value_hash: None,
            input_schema_hash: None,
            output_value: None,
            output_schema: None,
            status: None,
            duration: None,
        }
    }

    fn request(trace_id: &str, input_value: serde_json::Value) -> GetMockRequest {
        GetMockRequest {
            trace_id: trace_id.into(),
            is_pre_app_start: false,
            package_name: "http".into(),
            submodule_name: None,
            name: None,
            input_value,
            input_schema: None,
        }
    }

    #[test]
    fn scenario_with_matching_example_passes() {
        let scenario = ScenarioFile {
            examples: vec![ScenarioExample {
                id: "exact-hit".into(),
                description: String::new(),
                tags: vec!["smoke".into()],
                config: MatcherConfig::default(),
                trace_mocks: vec![span("t1", "s1", json!({"a": 1}))],
                suite_mocks: Vec::new(),
                global_mocks: Vec::new(),
                requests: vec![RequestCase {
                    request: request("t1", json!({"a": 1})),
                    expected: Expected {
                        matched_span_id: Some("s1".into()),
                        match_type: Some(MatchType::InputValueHash),
                        match_scope: Some(MatchScope::Trace),
                    },
                }],
            }],
        };
        let report = run_scenario(&scenario);
        assert!(report.all_passed());
        assert_eq!(report.passed(), 1);
    }

    #[test]
    fn scenario_expecting_a_miss_on_empty_store_passes() {
        let scenario = ScenarioFile {
            examples: vec![ScenarioExample {
                id: "clean-miss".into(),
                description: String::new(),
                tags: Vec::new(),
                config: MatcherConfig::default(),
                trace_mocks: Vec::new(),
                suite_mocks: Vec::new(),
                global_mocks: Vec::new(),
                requests: vec![RequestCase {
                    request: request("t1", json!({"a": 1})),
                    expected: Expected {
                        matched_span_id: None,
                        match_type: None,
                        match_scope: None,
                    },
                }],
            }],
        };
        let report = run_scenario(&scenario);
        assert!(report.all_passed());
    }

    #[test]
    fn sequential_requests_within_an_example_share_usage_state() {
        let scenario = ScenarioFile {
            examples: vec![ScenarioExample {
                id: "unused-oldest".into(),
                description: String::new(),
                tags: Vec::new(),
                config: MatcherConfig::default(),
                trace_mocks: vec![
                    Span {
                        timestamp: 1000,
                        ..span("t1", "s1", json!({"a": 1}))
                    },
                    Span {
                        timestamp: 2000,
                        ..span("t1", "s2", json!({"a": 1}))
                    },
                ],
                suite_mocks: Vec::new(),
                global_mocks: Vec::new(),
                requests: vec![
                    RequestCase {
                        request: request("t1", json!({"a": 1})),
                        expected: Expected {
                            matched_span_id: Some("s1".into()),
                            match_type: None,
                            match_scope: None,
                        },
                    },
                    RequestCase {
                        request: request("t1", json!({"a": 1})),
                        expected: Expected {
                            matched_span_id: Some("s2".into()),
                            match_type: None,
                            match_scope: None,
                        },
                    },
                    RequestCase {
                        request: request("t1", json!({"a": 1})),
                        expected: Expected {
                            matched_span_id: Some("s1".into()),
                            match_type: None,
                            match_scope: None,
                        },
                    },
                ],
            }],
        };
        let report = run_scenario(&scenario);
        assert!(report.all_passed());
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn by_tag_groups_outcomes() {
        let report = RunReport {
            outcomes: vec![
                ExampleOutcome {
                    example_id: "a".into(),
                    tags: vec!["http".into()],
                    passed: true,
                    detail: String::new(),
                },
                ExampleOutcome {
                    example_id: "b".into(),
                    tags: vec!["http".into()],
                    passed: false,
                    detail: String::new(),
                },
                ExampleOutcome {
                    example_id: "c".into(),
                    tags: Vec::new(),
                    passed: true,
                    detail: String::new(),
                },
            ],
        };
        let grouped = report.by_tag();
        assert_eq!(grouped["http"], (1, 1));
        assert_eq!(grouped["untagged"], (1, 0));
    }
}
