//! List state shared by the TUI and the CLI.
//!
//! `TodoStore` keeps the last fetched list together with the filter,
//! search and pagination state. Views are derived from that list on every
//! call. Mutations go to the backend and are followed by a full refetch;
//! the local copy is never patched in place.

use std::str::FromStr;

use crate::{
    api::{client::ApiClient, transport::Transport},
    errors::TodoError,
    models::todo_model::{Todo, TodoForm},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Active,
        StatusFilter::Completed,
    ];

    pub fn next(self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }

    pub fn accepts(self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Completed => "Completed",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" | "open" => Ok(StatusFilter::Active),
            "completed" | "done" => Ok(StatusFilter::Completed),
            other => Err(format!(
                "unknown filter '{}', expected all, active or completed",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
}

impl Counts {
    pub fn for_filter(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Active => self.active,
            StatusFilter::Completed => self.completed,
        }
    }
}

pub struct TodoStore<T: Transport> {
    client: ApiClient<T>,
    todos: Vec<Todo>,
    filter: StatusFilter,
    search: String,
    page: usize,
    page_size: usize,
    last_error: Option<String>,
}

impl<T: Transport> TodoStore<T> {
    pub fn new(client: ApiClient<T>, page_size: usize) -> Self {
        Self {
            client,
            todos: Vec::new(),
            filter: StatusFilter::All,
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
            last_error: None,
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[cfg(test)]
    pub fn all(&self) -> &[Todo] {
        &self.todos
    }

    /// Todos passing both the status filter and the search text
    pub fn filtered(&self) -> Vec<&Todo> {
        let needle = self.search.trim().to_lowercase();

        self.todos
            .iter()
            .filter(|todo| self.filter.accepts(todo) && todo.matches(&needle))
            .collect()
    }

    /// Never less than one, an empty list still has a (blank) first page
    pub fn total_pages(&self) -> usize {
        let total = self.filtered().len();
        std::cmp::max(1, (total + self.page_size - 1) / self.page_size)
    }

    pub fn page_items(&self) -> Vec<&Todo> {
        let start = (self.page - 1) * self.page_size;

        self.filtered()
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    pub fn counts(&self) -> Counts {
        let completed = self.todos.iter().filter(|t| t.completed).count();

        Counts {
            all: self.todos.len(),
            active: self.todos.len() - completed,
            completed,
        }
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_search<S: Into<String>>(&mut self, search: S) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Moves to `page`, clamped to the pages that exist
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Replace the local copy with the backend's list
    pub fn refresh(&mut self) -> Result<(), TodoError> {
        let result = self.client.list_todos();

        let todos = self.track(result)?;

        log::debug!("Fetched {} todos", todos.len());

        self.todos = todos;
        self.set_page(self.page);

        Ok(())
    }

    pub fn create(&mut self, form: &TodoForm) -> Result<Todo, TodoError> {
        let payload = self.track(form.validate().map_err(TodoError::from))?;

        let result = self.client.create_todo(&payload);
        let created = self.track(result)?;

        self.resync();

        Ok(created)
    }

    pub fn update(&mut self, id: i64, form: &TodoForm) -> Result<Todo, TodoError> {
        let payload = self.track(form.validate().map_err(TodoError::from))?;

        let result = self.client.update_todo(id, &payload);
        let updated = self.track(result)?;

        self.resync();

        Ok(updated)
    }

    /// Flips the completion flag of `todo`
    pub fn toggle(&mut self, todo: &Todo) -> Result<Todo, TodoError> {
        let result = self.client.toggle_todo(todo.id, !todo.completed);
        let toggled = self.track(result)?;

        self.resync();

        Ok(toggled)
    }

    pub fn delete(&mut self, id: i64) -> Result<(), TodoError> {
        let result = self.client.delete_todo(id);
        self.track(result)?;

        self.resync();

        Ok(())
    }

    /// Refetch after a change the backend has already accepted. The change
    /// stands even when the refetch fails, that failure is left in
    /// `last_error` for the caller to show.
    fn resync(&mut self) {
        if let Err(e) = self.refresh() {
            log::warn!("Could not reload todos after a change: {}", e);
        }
    }

    fn track<R>(&mut self, result: Result<R, TodoError>) -> Result<R, TodoError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }
}
