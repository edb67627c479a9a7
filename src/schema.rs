//! Static JSON schemas and record coercion
//!
//! One schema file per stream, embedded at compile time. The transform step
//! nudges raw API values onto their declared types before emission; it never
//! drops fields the schema does not know about.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Embedded JSON Schema per stream
pub static SCHEMAS: LazyLock<HashMap<&'static str, JsonValue>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert("addresses", parse(include_str!("../schemas/addresses.json")));
    m.insert("charges", parse(include_str!("../schemas/charges.json")));
    m.insert(
        "collections",
        parse(include_str!("../schemas/collections.json")),
    );
    m.insert("customers", parse(include_str!("../schemas/customers.json")));
    m.insert("discounts", parse(include_str!("../schemas/discounts.json")));
    m.insert(
        "metafields_customer",
        parse(include_str!("../schemas/metafields.json")),
    );
    m.insert(
        "metafields_store",
        parse(include_str!("../schemas/metafields.json")),
    );
    m.insert(
        "metafields_subscription",
        parse(include_str!("../schemas/metafields.json")),
    );
    m.insert("onetimes", parse(include_str!("../schemas/onetimes.json")));
    m.insert("orders", parse(include_str!("../schemas/orders.json")));
    m.insert("products", parse(include_str!("../schemas/products.json")));
    m.insert("shop", parse(include_str!("../schemas/shop.json")));
    m.insert(
        "subscriptions",
        parse(include_str!("../schemas/subscriptions.json")),
    );

    m
});

fn parse(raw: &str) -> JsonValue {
    serde_json::from_str(raw).expect("embedded schema is valid JSON")
}

/// Get the schema for a stream
pub fn get_schema(stream: &str) -> Result<&'static JsonValue> {
    SCHEMAS.get(stream).ok_or_else(|| Error::SchemaNotFound {
        stream: stream.to_string(),
    })
}

/// Coerce a record against its schema.
///
/// Declared integer/number/boolean properties arriving as strings (a quirk
/// of some older API revisions) are converted; everything else, including
/// undeclared fields, passes through untouched.
pub fn transform(record: &JsonValue, schema: &JsonValue) -> Result<JsonValue> {
    let Some(object) = record.as_object() else {
        return Err(Error::decode("record is not a JSON object"));
    };
    let Some(properties) = schema.get("properties").and_then(JsonValue::as_object) else {
        return Ok(record.clone());
    };

    let mut transformed = JsonObject::new();
    for (key, value) in object {
        let coerced = match properties.get(key) {
            Some(prop_schema) => coerce(value, prop_schema),
            None => value.clone(),
        };
        transformed.insert(key.clone(), coerced);
    }
    Ok(JsonValue::Object(transformed))
}

/// Coerce one value toward its declared type; leave it alone on any mismatch
fn coerce(value: &JsonValue, prop_schema: &JsonValue) -> JsonValue {
    let Some(declared) = declared_type(prop_schema) else {
        return value.clone();
    };

    match (declared, value) {
        ("integer", JsonValue::String(s)) => s
            .parse::<i64>()
            .map(JsonValue::from)
            .unwrap_or_else(|_| value.clone()),
        ("number", JsonValue::String(s)) => s
            .parse::<f64>()
            .map(JsonValue::from)
            .unwrap_or_else(|_| value.clone()),
        ("boolean", JsonValue::String(s)) => match s.as_str() {
            "true" => JsonValue::Bool(true),
            "false" => JsonValue::Bool(false),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

/// The first non-null declared type, handling both `"type": "integer"` and
/// `"type": ["null", "integer"]`
fn declared_type(prop_schema: &JsonValue) -> Option<&str> {
    match prop_schema.get("type") {
        Some(JsonValue::String(t)) => Some(t.as_str()),
        Some(JsonValue::Array(types)) => types
            .iter()
            .filter_map(JsonValue::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}
