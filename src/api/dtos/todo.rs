use serde::Deserialize;

use crate::models::todo_model::Todo;

/// The list endpoint answers with a bare array or with the array wrapped
/// under `todos` or `items`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TodoListDTO {
    Bare(Vec<Todo>),
    Todos { todos: Vec<Todo> },
    Items { items: Vec<Todo> },
}

impl TodoListDTO {
    pub fn into_todos(self) -> Vec<Todo> {
        match self {
            TodoListDTO::Bare(todos) => todos,
            TodoListDTO::Todos { todos } => todos,
            TodoListDTO::Items { items } => items,
        }
    }
}
