use serde_json::Value;

use crate::errors::TodoError;

const KNOWN_MESSAGE_KEYS: [&str; 3] = ["detail", "message", "error"];

/// Turns a non-2xx response into a `TodoError`.
///
/// `resource` names what was requested and is used for 404s.
pub fn normalize_error(status: u16, body: &str, resource: &str) -> TodoError {
    let message = extract_message(body).unwrap_or_else(|| fallback_message(status, body));

    match status {
        401 | 403 => TodoError::Unauthorized(message),
        404 => TodoError::NotFound(String::from(resource)),
        _ => TodoError::Api { status, message },
    }
}

/// Pulls a human readable message out of a JSON error body.
///
/// Understands `{"detail": "..."}`, validation lists such as
/// `{"detail": [{"loc": ["body", "title"], "msg": "field required"}]}`,
/// `{"message": "..."}` and `{"error": "..."}`.
pub fn extract_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    for key in KNOWN_MESSAGE_KEYS {
        let message = match json.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Array(items)) => {
                let parts: Vec<String> = items.iter().filter_map(describe_item).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            Some(Value::Object(inner)) => inner
                .get("message")
                .and_then(Value::as_str)
                .map(String::from),
            _ => None,
        };

        if message.is_some() {
            return message;
        }
    }

    None
}

fn describe_item(item: &Value) -> Option<String> {
    if let Some(text) = item.as_str() {
        return Some(text.to_string());
    }

    let msg = item.get("msg").or_else(|| item.get("message"))?.as_str()?;

    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|last| match last {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    match field {
        Some(field) => Some(format!("{}: {}", field, msg)),
        None => Some(msg.to_string()),
    }
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();

    if !body.is_empty() && !body.starts_with('{') && !body.starts_with('<') && body.len() <= 200 {
        return body.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unexpected response")
        .to_string()
}

#[cfg(test)]
mod errors_test {
    use super::*;

    #[test]
    fn test_detail_string() {
        assert_eq!(
            extract_message(r#"{"detail": "Todo not found"}"#),
            Some(String::from("Todo not found"))
        );
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail": [
            {"loc": ["body", "title"], "msg": "field required", "type": "value_error.missing"},
            {"loc": ["body", 0], "msg": "bad item"}
        ]}"#;

        assert_eq!(
            extract_message(body),
            Some(String::from("title: field required; 0: bad item"))
        );
    }

    #[test]
    fn test_message_and_error_keys() {
        assert_eq!(
            extract_message(r#"{"message": "Slow down"}"#),
            Some(String::from("Slow down"))
        );
        assert_eq!(
            extract_message(r#"{"error": {"message": "nested"}}"#),
            Some(String::from("nested"))
        );
    }

    #[test]
    fn test_status_branching() {
        assert!(matches!(
            normalize_error(401, r#"{"detail": "Not authenticated"}"#, "todos"),
            TodoError::Unauthorized(m) if m == "Not authenticated"
        ));
        assert!(matches!(
            normalize_error(403, "", "todos"),
            TodoError::Unauthorized(m) if m == "Forbidden"
        ));
        assert!(matches!(
            normalize_error(404, "", "todos/9"),
            TodoError::NotFound(r) if r == "todos/9"
        ));
        assert!(matches!(
            normalize_error(422, r#"{"detail": [{"loc": ["body", "title"], "msg": "too long"}]}"#, "todos"),
            TodoError::Api { status: 422, message } if message == "title: too long"
        ));
    }

    #[test]
    fn test_fallback_messages() {
        assert!(matches!(
            normalize_error(502, "<html>bad gateway</html>", "todos"),
            TodoError::Api { status: 502, message } if message == "Bad Gateway"
        ));
        assert!(matches!(
            normalize_error(500, "database is down", "todos"),
            TodoError::Api { status: 500, message } if message == "database is down"
        ));
    }
}
