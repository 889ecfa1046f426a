//! Text renderings of JSON values that match what a JavaScript frontend would produce:
//! ECMAScript number formatting and array-index keys ordered first.

use serde_json::{Map, Value};

/// Number text as `Number.prototype.toString` prints it (`1.0` => `1`, `1e21` => `1e+21`).
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) => ryu_js::Buffer::new().format(f).to_string(),
        None => n.to_string(),
    }
}

/// Object keys that are canonical `u32` indexes below `2^32 - 1`.
fn array_index(key: &str) -> Option<u32> {
    let n: u32 = key.parse().ok()?;
    (n != u32::MAX && n.to_string() == key).then_some(n)
}

/// Index keys ascending, then the remaining keys in insertion order.
fn ordered_entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut indexed: Vec<(u32, &String, &Value)> = Vec::new();
    let mut named = Vec::new();
    for (k, v) in map {
        match array_index(k) {
            Some(i) => indexed.push((i, k, v)),
            None => named.push((k, v)),
        }
    }
    indexed.sort_by_key(|(i, _, _)| *i);
    indexed
        .into_iter()
        .map(|(_, k, v)| (k, v))
        .chain(named)
        .collect()
}

fn write_string(s: &str, out: &mut String) {
    // serde_json escapes exactly the set JSON.stringify does for valid UTF-8.
    out.push_str(&Value::String(s.to_string()).to_string());
}

fn write_json(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&number_text(n)),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_json(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (k, v)) in ordered_entries(map).into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(k, out);
                out.push(':');
                write_json(v, out);
            }
            out.push('}');
        }
    }
}

/// Compact JSON text in `JSON.stringify` form.
pub(crate) fn stringify(value: &Value) -> String {
    let mut out = String::new();
    write_json(value, &mut out);
    out
}

/// Strings unquoted, numbers in ECMAScript form, everything else as [`stringify`] text.
pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        other => stringify(other),
    }
}
