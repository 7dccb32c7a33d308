//! Protocol-aware shape comparison (spec §4.3, Design Notes §9).
//!
//! The `reducedSchemaHash` rung alone is too coarse for some
//! protocols: two HTTP requests can share a schema hash yet differ in
//! query-parameter order, or carry headers that are expected to vary
//! between recordings (a timestamp, a request id). [`ShapeComparator`]
//! lets a package opt into a second, protocol-specific equality check
//! layered on top of the schema-hash rung, the same way the teacher's
//! `IndexBackend` trait lets a deployment swap in a different backend
//! by name without the caller knowing which one it got.

pub mod graphql;
pub mod http;
pub mod json_body;

use serde_json::Value;

/// A protocol-specific "are these two request shapes equivalent"
/// check, applied on top of the `InputSchemaHash`/
/// `InputSchemaHashReducedSchema` rungs.
pub trait ShapeComparator: Send + Sync {
    /// Compare a stored candidate's input value against an incoming
    /// request's input value. Both have already passed the
    /// `reducedSchemaHash` check; this only decides the finer-grained
    /// question a plain hash can't answer.
    fn shapes_match(&self, candidate: &Value, request: &Value) -> bool;
}

/// Look up the comparator registered for a package name, if any. A
/// package with no dedicated comparator relies on the hash rungs
/// alone — returning `None` is not an error. GraphQL traffic is
/// carried over `http`, so there is no separate `graphql` entry; the
/// HTTP comparator normalises a GraphQL-shaped body itself.
pub fn comparator_for(package_name: &str) -> Option<Box<dyn ShapeComparator>> {
    match package_name {
        "http" | "https" => Some(Box::new(http::HttpShapeComparator)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_package_has_no_comparator() {
        assert!(comparator_for("grpc").is_none());
    }

    #[test]
    fn http_package_resolves_a_comparator() {
        let comparator = comparator_for("http").expect("http should have a comparator");
        assert!(comparator.shapes_match(&json!({}), &json!({})));
    }
}
