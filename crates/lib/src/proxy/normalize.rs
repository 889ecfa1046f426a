//! Maps an arbitrary upstream JSON response onto the fixed reply shape the frontend expects.
//!
//! Field selection uses explicit truthiness: `null`, `false`, `0`, and `""` are skipped
//! in favour of the next candidate, so a present-but-empty `reply` falls through to `output`.

use super::js_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed-shape reply returned to callers on success. Key order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedReply {
    pub reply: String,
    pub intent: Option<String>,
    pub booking_url: Option<String>,
    pub product_url: Option<String>,
}

/// False for `null`, `false`, zero, and the empty string.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First of `keys` present on `value` with a truthy value.
fn first_truthy_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| is_truthy(v))
}

/// `choices[0].text`, else `choices[0].message`.
fn first_choice(data: &Value) -> Option<&Value> {
    let choice = data
        .get("choices")
        .filter(|c| is_truthy(c))
        .and_then(|c| c.get(0))
        .filter(|c| is_truthy(c))?;
    first_truthy_field(choice, &["text", "message"])
}

/// Reply text: `reply`, then `output`, then the first choice, then the whole response.
pub fn extract_reply(data: &Value) -> String {
    first_truthy_field(data, &["reply"])
        .or_else(|| first_truthy_field(data, &["output"]))
        .or_else(|| first_choice(data))
        .map(js_text::to_text)
        .unwrap_or_else(|| js_text::stringify(data))
}

fn optional_text(data: &Value, key: &str) -> Option<String> {
    first_truthy_field(data, &[key]).map(js_text::to_text)
}

pub fn normalize(data: &Value) -> NormalizedReply {
    NormalizedReply {
        reply: extract_reply(data),
        intent: optional_text(data, "intent"),
        booking_url: optional_text(data, "booking_url"),
        product_url: optional_text(data, "product_url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_field_wins() {
        let data = json!({"reply": "Hi there", "output": "other", "intent": "greeting"});
        let n = normalize(&data);
        assert_eq!(n.reply, "Hi there");
        assert_eq!(n.intent.as_deref(), Some("greeting"));
        assert_eq!(n.booking_url, None);
        assert_eq!(n.product_url, None);
    }

    #[test]
    fn output_used_when_reply_missing() {
        assert_eq!(extract_reply(&json!({"output": "out"})), "out");
    }

    #[test]
    fn falsy_reply_falls_through_to_output() {
        assert_eq!(extract_reply(&json!({"reply": "", "output": "out"})), "out");
        assert_eq!(extract_reply(&json!({"reply": 0, "output": "out"})), "out");
        assert_eq!(extract_reply(&json!({"reply": null, "output": "out"})), "out");
        assert_eq!(extract_reply(&json!({"reply": false, "output": "out"})), "out");
    }

    #[test]
    fn choice_text_then_message() {
        assert_eq!(extract_reply(&json!({"choices": [{"text": "A"}]})), "A");
        assert_eq!(
            extract_reply(&json!({"choices": [{"text": "", "message": "B"}]})),
            "B"
        );
        assert_eq!(
            extract_reply(&json!({"choices": [{"message": {"role": "assistant", "content": "C"}}]})),
            r#"{"role":"assistant","content":"C"}"#
        );
    }

    #[test]
    fn empty_choices_fall_back_to_whole_response() {
        assert_eq!(
            extract_reply(&json!({"choices": []})),
            r#"{"choices":[]}"#
        );
        assert_eq!(
            extract_reply(&json!({"choices": [{}]})),
            r#"{"choices":[{}]}"#
        );
    }

    #[test]
    fn empty_object_falls_back_to_its_text() {
        assert_eq!(extract_reply(&json!({})), "{}");
    }

    #[test]
    fn non_string_reply_is_coerced() {
        assert_eq!(extract_reply(&json!({"reply": 42})), "42");
        assert_eq!(extract_reply(&json!({"reply": true})), "true");
        assert_eq!(extract_reply(&json!({"reply": [1, 2]})), "[1,2]");
        assert_eq!(extract_reply(&json!({"reply": 1.0})), "1");
    }

    #[test]
    fn fallback_text_matches_frontend_json() {
        let data: Value = serde_json::from_str(r#"{"b":1,"1":2}"#).unwrap();
        assert_eq!(extract_reply(&data), r#"{"1":2,"b":1}"#);
        let data: Value = serde_json::from_str(r#"{"score":1.0,"n":1e2}"#).unwrap();
        assert_eq!(extract_reply(&data), r#"{"score":1,"n":100}"#);
    }

    #[test]
    fn optional_fields_are_independent() {
        let n = normalize(&json!({
            "reply": "ok",
            "booking_url": "https://book.example/x",
            "product_url": ""
        }));
        assert_eq!(n.intent, None);
        assert_eq!(n.booking_url.as_deref(), Some("https://book.example/x"));
        assert_eq!(n.product_url, None);
    }

    #[test]
    fn serializes_in_wire_order_with_nulls() {
        let n = normalize(&json!({"reply": "Hi there", "intent": "greeting"}));
        assert_eq!(
            serde_json::to_string(&n).unwrap(),
            r#"{"reply":"Hi there","intent":"greeting","booking_url":null,"product_url":null}"#
        );
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(-1)));
    }
}
