//! HTTP shape equality (spec §4.3): the four-part comparison used for
//! the `INPUT_SCHEMA_HASH` rungs once the schema hashes already agree.
//! A plain hash treats `?a=1&b=2` and `?b=2&a=1` as different inputs;
//! this comparator is the seam that makes them the same request.

use serde_json::Value;
use url::Url;

use super::graphql::normalize_query;
use super::json_body::coerce_json_body;
use super::ShapeComparator;

/// Headers that are expected to vary between a recording and a replay
/// without changing what request is "the same" one — correlation ids,
/// timestamps, and client identification. `authorization` is compared
/// by presence only (its value, e.g. a bearer token, is excluded).
const IGNORED_HEADERS: &[&str] = &["date", "x-request-id", "user-agent"];
const BEARER_VALUE_IGNORED_HEADER: &str = "authorization";

/// Canonicalise a URL to scheme + host + path + sorted query params.
/// Fragment is dropped entirely: it never reaches a server. A missing
/// port or a trailing slash on the path are not significant, which
/// `url::Url`'s own normalisation already handles. Malformed input
/// falls back to the raw string so comparison degenerates to plain
/// equality rather than panicking.
pub fn normalize_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let mut query_pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    query_pairs.sort();

    let path = url.path().trim_end_matches('/');
    let mut normalized = format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or(""), path);
    if !query_pairs.is_empty() {
        let query = query_pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        normalized.push('?');
        normalized.push_str(&query);
    }
    normalized
}

fn headers_match(a: &Value, b: &Value) -> bool {
    let (Some(a_obj), Some(b_obj)) = (a.as_object(), b.as_object()) else {
        return a == b;
    };
    let relevant = |obj: &serde_json::Map<String, Value>| {
        let mut kept: Vec<(String, Option<Value>)> = obj
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .filter(|(k, _)| !IGNORED_HEADERS.contains(&k.as_str()))
            .map(|(k, v)| {
                if k == BEARER_VALUE_IGNORED_HEADER {
                    (k, None)
                } else {
                    (k, Some(v))
                }
            })
            .collect();
        kept.sort_by(|x, y| x.0.cmp(&y.0));
        kept
    };
    relevant(a_obj) == relevant(b_obj)
}

/// Body comparison: JSON-ish strings are parsed before comparing, and
/// a GraphQL-shaped body (an object with a `query` string) has that
/// query whitespace/comment-folded before comparison.
fn bodies_match(a: &Value, b: &Value) -> bool {
    let a = coerce_json_body(a);
    let b = coerce_json_body(b);

    match (a.get("query"), b.get("query")) {
        (Some(Value::String(a_query)), Some(Value::String(b_query))) => {
            if normalize_query(a_query) != normalize_query(b_query) {
                return false;
            }
            a.get("variables") == b.get("variables")
        }
        _ => a == b,
    }
}

pub struct HttpShapeComparator;

impl ShapeComparator for HttpShapeComparator {
    fn shapes_match(&self, candidate: &Value, request: &Value) -> bool {
        if candidate.get("method") != request.get("method") {
            return false;
        }

        let url_matches = match (candidate.get("url"), request.get("url")) {
            (Some(Value::String(a)), Some(Value::String(b))) => normalize_url(a) == normalize_url(b),
            (None, None) => true,
            _ => false,
        };
        if !url_matches {
            return false;
        }

        match (candidate.get("headers"), request.get("headers")) {
            (Some(a), Some(b)) => {
                if !headers_match(a, b) {
                    return false;
                }
            }
            (None, None) => {}
            _ => return false,
        }

        match (candidate.get("body"), request.get("body")) {
            (Some(a), Some(b)) => bodies_match(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
