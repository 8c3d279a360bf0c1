//! Text sanitising and format predicates

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static HEX_COLOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#?([0-9A-Fa-f]{3}|[0-9A-Fa-f]{4}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$")
        .expect("hex colour pattern is valid")
});

/// Replace HTML-significant characters with entities
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Text form of a scalar JSON value; `null` reads as empty
///
/// Arrays and objects have no text form.
#[must_use]
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Trim then escape
#[must_use]
pub fn clean_text(value: &Value) -> Option<String> {
    as_text(value).map(|s| escape_html(s.trim()))
}

#[must_use]
pub fn is_hex_colour(input: &str) -> bool {
    HEX_COLOUR.is_match(input)
}

/// Accept any JSON value; strings must themselves contain JSON
#[must_use]
pub fn json_blob(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => serde_json::from_str(s).ok(),
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape() {
        assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;&#x2F;script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_hex_colours() {
        for ok in ["#fff", "FFF", "#ffff", "#00ff00", "00FF00AA"] {
            assert!(is_hex_colour(ok), "{ok}");
        }
        for bad in ["", "#", "#ff", "#fffff", "#gggggg", "#00ff00a", "red"] {
            assert!(!is_hex_colour(bad), "{bad}");
        }
    }

    #[test]
    fn test_text_forms() {
        assert_eq!(clean_text(&json!("  Rain  ")), Some("Rain".to_string()));
        assert_eq!(clean_text(&json!(5)), Some("5".to_string()));
        assert_eq!(clean_text(&Value::Null), Some(String::new()));
        assert_eq!(clean_text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_json_blobs() {
        assert_eq!(json_blob(&json!({"x": 1})), Some(json!({"x": 1})));
        assert_eq!(json_blob(&json!("[1,2]")), Some(json!([1, 2])));
        assert_eq!(json_blob(&json!("42")), Some(json!(42)));
        assert_eq!(json_blob(&json!("{not json")), None);
        assert_eq!(json_blob(&Value::Null), None);
    }
}
