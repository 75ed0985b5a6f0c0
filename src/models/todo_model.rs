use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates;

pub const TITLE_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(alias = "created_at", deserialize_with = "dates::deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        alias = "updated_at",
        deserialize_with = "dates::deserialize_optional_timestamp"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Case-insensitive match against title and description.
    /// `needle` is expected to be lowercase already.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_ref()
                .map(|d| d.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

/// Body of create (POST) and replace (PUT) requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
}

/// Body of the completion toggle (PATCH)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TogglePayload {
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();

        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw user input for the create and edit forms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
}

impl TodoForm {
    pub fn new<T: Into<String>>(title: T, description: T) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn from_todo(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            description: todo.description.clone().unwrap_or_default(),
        }
    }

    /// Checks every field and returns the payload to submit.
    /// All failing fields are reported at once.
    pub fn validate(&self) -> Result<NewTodo, ValidationErrors> {
        let title = self.title.trim();
        let description = self.description.trim();

        let mut errors = Vec::new();

        if title.is_empty() {
            errors.push(FieldError {
                field: "title",
                message: String::from("Title is required"),
            });
        } else if title.chars().count() > TITLE_MAX_LEN {
            errors.push(FieldError {
                field: "title",
                message: format!("Title must be at most {} characters", TITLE_MAX_LEN),
            });
        }

        if description.chars().count() > DESCRIPTION_MAX_LEN {
            errors.push(FieldError {
                field: "description",
                message: format!(
                    "Description must be at most {} characters",
                    DESCRIPTION_MAX_LEN
                ),
            });
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(NewTodo {
            title: title.to_string(),
            description: if description.is_empty() {
                None
            } else {
                Some(description.to_string())
            },
        })
    }
}
