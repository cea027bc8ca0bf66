//! String-coercible values from host metadata.

use serde_json::Value;

/// An option value as the host declares it.
///
/// Most option lists hold plain strings. Some custom nodes list objects or
/// nested lists instead; those are normalized once here and the rest of the
/// engine only sees strings.
#[derive(Debug, Clone, PartialEq)]
pub enum StringLike {
    Literal(String),
    Coercible(Value),
}

impl From<&Value> for StringLike {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => StringLike::Literal(s.clone()),
            other => StringLike::Coercible(other.clone()),
        }
    }
}

impl From<&str> for StringLike {
    fn from(value: &str) -> Self {
        StringLike::Literal(value.to_string())
    }
}

impl StringLike {
    /// Coerce to a non-empty string.
    ///
    /// Objects yield their `name` or `value` field, falling back to their
    /// JSON text. Lists join their items with `,`, matching how the host
    /// renders multi-file entries.
    pub fn normalize(&self) -> Option<String> {
        let text = match self {
            StringLike::Literal(s) => s.clone(),
            StringLike::Coercible(value) => coerce(value)?,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(coerce)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(map) => ["name", "value"]
            .iter()
            .filter_map(|field| map.get(*field).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_variants() {
        assert_eq!(
            StringLike::from(&json!("a.safetensors")).normalize().as_deref(),
            Some("a.safetensors")
        );
        assert_eq!(
            StringLike::from(&json!({"name": "b.ckpt", "value": "ignored"})).normalize().as_deref(),
            Some("b.ckpt")
        );
        assert_eq!(
            StringLike::from(&json!({"value": "c.pt"})).normalize().as_deref(),
            Some("c.pt")
        );
        assert_eq!(
            StringLike::from(&json!(["x.pt", "y.pt"])).normalize().as_deref(),
            Some("x.pt,y.pt")
        );
        assert_eq!(StringLike::from(&json!(3)).normalize().as_deref(), Some("3"));
        assert_eq!(StringLike::from(&Value::Null).normalize(), None);
        assert_eq!(StringLike::from("").normalize(), None);
    }

    #[test]
    fn test_object_without_name_uses_json_text() {
        let text = StringLike::from(&json!({"id": 1})).normalize().unwrap();
        assert_eq!(text, r#"{"id":1}"#);
    }
}
