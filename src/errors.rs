use derive_more::Display;

use crate::models::todo_model::ValidationErrors;

/// Every failure the client can surface, normalized so the UI only has to
/// branch on one type.
#[derive(Debug, Display)]
pub enum TodoError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationErrors),

    #[display(fmt = "Unauthorized: {}", _0)]
    Unauthorized(String),

    #[display(fmt = "{} Not Found", _0)]
    NotFound(String),

    #[display(fmt = "Server responded with {}: {}", status, message)]
    Api { status: u16, message: String },

    #[display(fmt = "Backend unreachable: {}", _0)]
    Network(String),

    #[display(fmt = "Invalid response: {}", _0)]
    Decode(String),

    #[display(fmt = "Storage error: {}", _0)]
    Storage(String),

    #[display(fmt = "Configuration error: {}", _0)]
    Config(String),
}

impl TodoError {
    /// True when logging in again would fix the failure
    pub fn is_auth(&self) -> bool {
        matches!(self, TodoError::Unauthorized(_))
    }
}

impl std::error::Error for TodoError {}

impl From<reqwest::Error> for TodoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TodoError::Decode(e.to_string())
        } else {
            TodoError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(e: serde_json::Error) -> Self {
        TodoError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for TodoError {
    fn from(e: std::io::Error) -> Self {
        TodoError::Storage(e.to_string())
    }
}

impl From<ValidationErrors> for TodoError {
    fn from(e: ValidationErrors) -> Self {
        TodoError::Validation(e)
    }
}

#[cfg(test)]
mod errors_test {
    use super::TodoError;

    #[test]
    fn test_display_messages() {
        let err = TodoError::Api {
            status: 500,
            message: String::from("boom"),
        };
        assert_eq!(err.to_string(), "Server responded with 500: boom");

        let err = TodoError::NotFound(String::from("Todo 4"));
        assert_eq!(err.to_string(), "Todo 4 Not Found");
    }

    #[test]
    fn test_is_auth() {
        assert!(TodoError::Unauthorized(String::from("expired")).is_auth());
        assert!(!TodoError::Network(String::from("refused")).is_auth());
    }

    #[test]
    fn test_json_error_is_decode() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TodoError = json_err.into();
        assert!(matches!(err, TodoError::Decode(_)));
    }
}
