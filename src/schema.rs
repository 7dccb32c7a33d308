//! The schema reducer (spec §4.2).
//!
//! A [`Schema`] annotates the shape of a JSON value with, at each leaf,
//! a `match_importance` in `[0, 1]`. Reducing a value against its
//! schema drops every subtree whose importance is exactly `0`,
//! recursively — the idea being that two requests which differ only in
//! fields nobody cares about for matching purposes (a trace id embedded
//! in a request body, say) should still be considered the same
//! request once those fields are stripped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::hash::hash_value;

/// Recursive, JSON-Schema-flavoured annotation of a value's shape.
///
/// `properties` and `items` mirror JSON Schema's object/array shape;
/// `match_importance` is the one field this format adds on top of that.
/// A `Schema` owns all of its children, so there is no way to construct
/// a cycle through safe code — the acyclic precondition in spec §9 is
/// therefore structural, not merely assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(
        rename = "matchImportance",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub match_importance: Option<f64>,
}

impl Schema {
    fn is_zero_importance(&self) -> bool {
        matches!(self.match_importance, Some(importance) if importance == 0.0)
    }
}

/// Reduce `value` under `schema`, dropping every leaf (and, for
/// objects/arrays, every subtree) whose schema marks `match_importance
/// == 0`. A missing schema returns `value` unchanged.
pub fn reduce(value: &Value, schema: Option<&Schema>) -> Value {
    let Some(schema) = schema else {
        return value.clone();
    };
    if schema.is_zero_importance() {
        return Value::Null;
    }
    match value {
        Value::Object(map) => {
            let Some(properties) = &schema.properties else {
                return value.clone();
            };
            let mut reduced = Map::new();
            for (key, child) in map {
                match properties.get(key) {
                    Some(child_schema) if child_schema.is_zero_importance() => continue,
                    Some(child_schema) => {
                        reduced.insert(key.clone(), reduce(child, Some(child_schema)));
                    }
                    None => {
                        reduced.insert(key.clone(), child.clone());
                    }
                }
            }
            Value::Object(reduced)
        }
        Value::Array(items) => {
            let Some(item_schema) = &schema.items else {
                return value.clone();
            };
            if item_schema.is_zero_importance() {
                return Value::Null;
            }
            Value::Array(
                items
                    .iter()
                    .map(|item| reduce(item, Some(item_schema)))
                    .collect(),
            )
        }
        scalar => scalar.clone(),
    }
}

/// Reduce a schema itself, dropping every subtree marked `match_importance
/// == 0`. Used to derive `reducedSchemaHash`.
pub fn reduce_schema(schema: &Schema) -> Schema {
    Schema {
        schema_type: schema.schema_type.clone(),
        properties: schema.properties.as_ref().map(|props| {
            props
                .iter()
                .filter(|(_, child)| !child.is_zero_importance())
                .map(|(key, child)| (key.clone(), reduce_schema(child)))
                .collect()
        }),
        items: schema.items.as_ref().and_then(|item| {
            if item.is_zero_importance() {
                None
            } else {
                Some(Box::new(reduce_schema(item)))
            }
        }),
        match_importance: schema.match_importance,
    }
}

/// `reducedValueHash(v, s)` from spec §4.2.
pub fn reduced_value_hash(value: &Value, schema: Option<&Schema>) -> String {
    hash_value(&reduce(value, schema))
}

/// `reducedSchemaHash(s)` from spec §4.2. A missing schema has no
/// reduced form to hash against; callers should not reach this rung
/// without a schema present.
pub fn reduced_schema_hash(schema: &Schema) -> String {
    let reduced = reduce_schema(schema);
    let as_value = serde_json::to_value(&reduced).expect("Schema serialises to JSON");
    hash_value(&as_value)
}
