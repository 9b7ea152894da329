//! Delta cleaning.
//!
//! Note bodies come from an editor and are untrusted. Cleaning keeps plain
//! string inserts and a small set of formatting attributes, drops embeds,
//! and guarantees the document ends with a newline.

use serde_json::{Map, Value};
use tracing::debug;

use casefile_entity::note::{DeltaDocument, DeltaOp};

const BOOLEAN_ATTRIBUTES: [&str; 3] = ["bold", "italic", "underline"];
const SAFE_LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Parse and clean raw Delta JSON. Anything unparseable yields the empty
/// document.
pub fn clean_delta_json(raw: &str) -> DeltaDocument {
    let raw = raw.trim();
    if raw.is_empty() {
        return DeltaDocument::empty();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => clean_delta_value(&value),
        Err(e) => {
            debug!(error = %e, "Discarding unparseable delta");
            DeltaDocument::empty()
        }
    }
}

/// Clean an already parsed JSON value.
pub fn clean_delta_value(value: &Value) -> DeltaDocument {
    let Some(ops) = value.get("ops").and_then(Value::as_array) else {
        return DeltaDocument::empty();
    };
    let ops = ops
        .iter()
        .filter_map(|op| {
            let insert = op.get("insert")?.as_str()?;
            let attributes = op.get("attributes").and_then(Value::as_object);
            clean_op(insert, attributes)
        })
        .collect();
    finish(ops)
}

/// Clean a typed document.
pub fn clean_delta(document: &DeltaDocument) -> DeltaDocument {
    let ops = document
        .ops
        .iter()
        .filter_map(|op| clean_op(&op.insert, op.attributes.as_ref()))
        .collect();
    finish(ops)
}

/// Serialize a cleaned document to its on-disk form.
pub fn to_json(document: &DeltaDocument) -> String {
    // A document of strings and JSON maps always serializes.
    serde_json::to_string(document).unwrap_or_else(|_| r#"{"ops":[{"insert":"\n"}]}"#.to_string())
}

fn clean_op(insert: &str, attributes: Option<&Map<String, Value>>) -> Option<DeltaOp> {
    if insert.is_empty() {
        return None;
    }
    Some(DeltaOp {
        insert: insert.to_string(),
        attributes: attributes.and_then(clean_attributes),
    })
}

fn finish(mut ops: Vec<DeltaOp>) -> DeltaDocument {
    if ops.is_empty() {
        return DeltaDocument::empty();
    }
    if ops.last().is_some_and(|op| !op.insert.ends_with('\n')) {
        ops.push(DeltaOp::text("\n"));
    }
    DeltaDocument { ops }
}

fn clean_attributes(attributes: &Map<String, Value>) -> Option<Map<String, Value>> {
    let mut cleaned = Map::new();

    for key in BOOLEAN_ATTRIBUTES {
        if let Some(Value::Bool(flag)) = attributes.get(key) {
            cleaned.insert(key.to_string(), Value::Bool(*flag));
        }
    }

    if let Some(level) = attributes.get("header").and_then(Value::as_i64) {
        if (1..=3).contains(&level) {
            cleaned.insert("header".to_string(), Value::from(level));
        }
    }

    if let Some(list) = attributes.get("list").and_then(Value::as_str) {
        let list = list.trim().to_lowercase();
        if list == "ordered" || list == "bullet" {
            cleaned.insert("list".to_string(), Value::String(list));
        }
    }

    if let Some(link) = attributes.get("link").and_then(Value::as_str) {
        let link = link.trim();
        if is_safe_link(link) {
            cleaned.insert("link".to_string(), Value::String(link.to_string()));
        }
    }

    (!cleaned.is_empty()).then_some(cleaned)
}

/// Whether `link` is an absolute URL with an allowed scheme.
fn is_safe_link(link: &str) -> bool {
    let Some((scheme, rest)) = link.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme || rest.is_empty() || link.chars().any(char::is_whitespace) {
        return false;
    }

    let scheme = scheme.to_ascii_lowercase();
    if !SAFE_LINK_SCHEMES.contains(&scheme.as_str()) {
        return false;
    }
    if scheme == "mailto" {
        return true;
    }
    rest.strip_prefix("//")
        .and_then(|authority| authority.split(['/', '?', '#']).next())
        .is_some_and(|host| !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unparseable_and_empty_input_yield_empty_document() {
        assert_eq!(clean_delta_json(""), DeltaDocument::empty());
        assert_eq!(clean_delta_json("not json"), DeltaDocument::empty());
        assert_eq!(clean_delta_json(r#"{"ops":"nope"}"#), DeltaDocument::empty());
        assert_eq!(clean_delta_json(r#"{"ops":[]}"#), DeltaDocument::empty());
    }

    #[test]
    fn test_embeds_and_empty_inserts_are_dropped() {
        let raw = json!({
            "ops": [
                {"insert": {"image": "data:image/png;base64,AAAA"}},
                {"insert": ""},
                {"insert": "Hello\n"},
                "garbage"
            ]
        });
        let doc = clean_delta_value(&raw);
        assert_eq!(doc.ops, vec![DeltaOp::text("Hello\n")]);
    }

    #[test]
    fn test_trailing_newline_is_appended() {
        let doc = clean_delta_json(r#"{"ops":[{"insert":"Hello"}]}"#);
        assert_eq!(doc.plain_text(), "Hello\n");
        assert_eq!(doc.ops.len(), 2);
        assert!(doc.ends_with_newline());
    }

    #[test]
    fn test_attributes_are_filtered() {
        let raw = json!({
            "ops": [{
                "insert": "x\n",
                "attributes": {
                    "bold": true,
                    "italic": "yes",
                    "header": 4,
                    "list": " Bullet ",
                    "color": "#ff0000",
                    "link": "javascript:alert(1)"
                }
            }]
        });
        let doc = clean_delta_value(&raw);
        let attrs = doc.ops[0].attributes.as_ref().unwrap();
        assert_eq!(attrs.get("bold"), Some(&Value::Bool(true)));
        assert_eq!(attrs.get("list"), Some(&Value::String("bullet".into())));
        assert!(!attrs.contains_key("italic"));
        assert!(!attrs.contains_key("header"));
        assert!(!attrs.contains_key("color"));
        assert!(!attrs.contains_key("link"));
    }

    #[test]
    fn test_attributes_removed_entirely_when_nothing_survives() {
        let raw = json!({"ops": [{"insert": "x\n", "attributes": {"color": "red"}}]});
        let doc = clean_delta_value(&raw);
        assert!(doc.ops[0].attributes.is_none());
    }

    #[test]
    fn test_safe_links() {
        assert!(is_safe_link("https://example.com/a?b"));
        assert!(is_safe_link("HTTP://example.com"));
        assert!(is_safe_link("mailto:someone@example.com"));
        assert!(!is_safe_link("javascript:alert(1)"));
        assert!(!is_safe_link("data:text/html,hi"));
        assert!(!is_safe_link("/relative/path"));
        assert!(!is_safe_link("https://"));
        assert!(!is_safe_link("https:// example.com"));
    }

    #[test]
    fn test_clean_typed_document() {
        let doc = DeltaDocument {
            ops: vec![DeltaOp::text(""), DeltaOp::text("Body")],
        };
        let cleaned = clean_delta(&doc);
        assert_eq!(cleaned.plain_text(), "Body\n");
    }

    #[test]
    fn test_to_json_of_empty_document() {
        assert_eq!(to_json(&DeltaDocument::empty()), r#"{"ops":[{"insert":"\n"}]}"#);
    }
}
