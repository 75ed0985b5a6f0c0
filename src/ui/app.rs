use crossterm::event::KeyCode;
use tui::widgets::ListState;

use crate::{
    api::{health::HealthWatcher, transport::Transport},
    errors::TodoError,
    models::todo_model::{Todo, TodoForm, ValidationErrors},
    store::TodoStore,
};

pub struct StatefulList<T> {
    pub state: ListState,
    pub items: Vec<T>,
}

impl<T> StatefulList<T> {
    pub fn with_items(items: Vec<T>) -> StatefulList<T> {
        StatefulList {
            state: ListState::default(),
            items,
        }
    }

    /// Swap in a new page of items, keeping the selection in range
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;

        let selected = match (self.state.selected(), self.items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.state.select(selected);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InputMode {
    None,
    Editing,
}

/// Field of the todo form that receives typed keys
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FormField {
    Title,
    Description,
}

impl FormField {
    pub fn next(self) -> FormField {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::Title,
        }
    }

    fn first_invalid(errors: &ValidationErrors) -> FormField {
        if errors.for_field("title").is_some() {
            FormField::Title
        } else {
            FormField::Description
        }
    }
}

#[derive(Debug)]
pub struct Route {
    pub id: RouteId,
    pub active_block: ActiveBlock,
}

#[derive(Clone, PartialEq, Debug)]
pub enum RouteId {
    Home,
    Error,
    Message,
    NewTodo,
    EditTodo,
    Search,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ActiveBlock {
    Home,
    Error,
    Message,
    Input,
}

pub const DEFAULT_ROUTE: Route = Route {
    id: RouteId::Home,
    active_block: ActiveBlock::Home,
};

/// State of the interactive dashboard. The todo data itself lives in the
/// store; `list` only mirrors the page currently on screen.
pub struct App<T: Transport> {
    pub store: TodoStore<T>,
    pub health: HealthWatcher,
    pub list: StatefulList<Todo>,
    pub error_message: String,
    /// Text of the search box
    pub input_text: String,
    pub form: TodoForm,
    pub focus: FormField,
    pub message: String,
    pub input_mode: InputMode,
    editing: Option<Todo>,
    navigation_stack: Vec<Route>,
}

impl<T: Transport> App<T> {
    pub fn new(store: TodoStore<T>, health: HealthWatcher) -> App<T> {
        App {
            store,
            health,
            list: StatefulList::with_items(vec![]),
            error_message: String::new(),
            input_mode: InputMode::None,
            input_text: String::new(),
            form: TodoForm::default(),
            focus: FormField::Title,
            message: String::new(),
            editing: None,
            navigation_stack: vec![DEFAULT_ROUTE],
        }
    }

    /// Initial fetch; a failure is shown instead of aborting
    pub fn load(&mut self) {
        let result = self.store.refresh();
        self.report(result, None);
    }

    /// Picks up the latest backend health status
    pub fn on_tick(&mut self) {
        self.health.refresh();
    }

    /// Gets the current active route
    pub fn get_current_route(&self) -> &Route {
        self.navigation_stack.last().unwrap_or(&DEFAULT_ROUTE)
    }

    /// Push a route to the navigation stack
    /// so that it is rendered
    pub fn push_navigation_stack(&mut self, route_id: RouteId, active_block: ActiveBlock) {
        self.navigation_stack.push(Route {
            id: route_id,
            active_block,
        });
    }

    pub fn pop_navigation_stack(&mut self) -> Option<Route> {
        if self.navigation_stack.len() == 1 {
            None
        } else {
            self.navigation_stack.pop()
        }
    }

    pub fn handle_error(&mut self, e: &TodoError) {
        self.error_message = if e.is_auth() {
            format!("{}\nRun `todo-dash login` and try again.", e)
        } else {
            e.to_string()
        };

        self.push_navigation_stack(RouteId::Error, ActiveBlock::Error);
    }

    pub fn handle_new_message<S: Into<String>>(&mut self, m: S) {
        let active_block = self.get_current_route().active_block;
        if active_block == ActiveBlock::Message || active_block == ActiveBlock::Error {
            self.pop_navigation_stack();
        }

        self.push_navigation_stack(RouteId::Message, ActiveBlock::Message);
        self.message = m.into();
    }

    /// Handles one key press. Returns `true` when the app should quit.
    pub fn on_key(&mut self, code: KeyCode) -> bool {
        match self.input_mode {
            InputMode::None => return self.on_navigation_key(code),
            InputMode::Editing => self.on_editing_key(code),
        }
        false
    }

    fn on_navigation_key(&mut self, code: KeyCode) -> bool {
        match self.get_current_route().active_block {
            ActiveBlock::Error | ActiveBlock::Message => {
                match code {
                    KeyCode::Esc | KeyCode::Enter => {
                        self.pop_navigation_stack();
                        self.resume_input();
                    }
                    KeyCode::Char('q') => return true,
                    _ => {}
                }
                return false;
            }
            ActiveBlock::Input => return false,
            ActiveBlock::Home => {}
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => self.list.next(),
            KeyCode::Up | KeyCode::Char('k') => self.list.previous(),
            KeyCode::Right => {
                self.store.next_page();
                self.sync_list();
            }
            KeyCode::Left => {
                self.store.prev_page();
                self.sync_list();
            }
            KeyCode::Tab => {
                let next = self.store.filter().next();
                self.store.set_filter(next);
                self.sync_list();
            }
            KeyCode::Char('/') => {
                self.input_text = self.store.search().to_string();
                self.start_editing(RouteId::Search);
            }
            KeyCode::Char('a') => {
                self.form = TodoForm::default();
                self.editing = None;
                self.start_editing(RouteId::NewTodo);
            }
            KeyCode::Char('e') => {
                if let Some(todo) = self.list.selected_item().cloned() {
                    self.form = TodoForm::from_todo(&todo);
                    self.editing = Some(todo);
                    self.start_editing(RouteId::EditTodo);
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('d') => {
                if let Some(todo) = self.list.selected_item().cloned() {
                    let result = self.store.toggle(&todo);
                    self.report(result, None);
                }
            }
            KeyCode::Char('x') => {
                if let Some(todo) = self.list.selected_item().cloned() {
                    let result = self.store.delete(todo.id);
                    self.report(result, Some(String::from("Todo Item Deleted")));
                }
            }
            KeyCode::Char('r') => {
                let result = self.store.refresh();
                self.report(result, None);
            }
            _ => {}
        }

        false
    }

    fn on_editing_key(&mut self, code: KeyCode) {
        let route = self.get_current_route().id.clone();

        if route == RouteId::Search {
            return self.on_search_key(code);
        }

        match code {
            KeyCode::Char(c) => self.focused_field().push(c),
            KeyCode::Backspace => {
                self.focused_field().pop();
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => self.focus = self.focus.next(),
            KeyCode::Esc => self.stop_editing(),
            KeyCode::Enter => self.submit(route),
            _ => {}
        }
    }

    fn on_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                self.input_text.push(c);
                self.apply_search();
            }
            KeyCode::Backspace => {
                self.input_text.pop();
                self.apply_search();
            }
            KeyCode::Esc => {
                self.input_text = String::new();
                self.apply_search();
                self.stop_editing();
            }
            KeyCode::Enter => {
                self.apply_search();
                self.stop_editing();
            }
            _ => {}
        }
    }

    fn focused_field(&mut self) -> &mut String {
        match self.focus {
            FormField::Title => &mut self.form.title,
            FormField::Description => &mut self.form.description,
        }
    }

    /// Sends the form. On success the form is closed, even when reloading
    /// the list afterwards fails. On failure the typed text is kept so the
    /// user can fix it after dismissing the error.
    fn submit(&mut self, route: RouteId) {
        let editing_id = self.editing.as_ref().map(|todo| todo.id);

        let (result, message) = match (route, editing_id) {
            (RouteId::NewTodo, _) => (self.store.create(&self.form), "Todo created"),
            (RouteId::EditTodo, Some(id)) => (self.store.update(id, &self.form), "Todo updated"),
            _ => return self.stop_editing(),
        };

        if let Err(TodoError::Validation(errors)) = &result {
            self.focus = FormField::first_invalid(errors);
        }

        if result.is_ok() {
            self.editing = None;
            self.stop_editing();
            self.report(result, Some(String::from(message)));
        } else {
            self.input_mode = InputMode::None;
            self.report(result, None);
        }
    }

    fn start_editing(&mut self, route: RouteId) {
        self.focus = FormField::Title;
        self.push_navigation_stack(route, ActiveBlock::Input);
        self.input_mode = InputMode::Editing;
    }

    fn stop_editing(&mut self) {
        self.input_mode = InputMode::None;
        self.input_text = String::new();
        self.form = TodoForm::default();
        if self.get_current_route().active_block == ActiveBlock::Input {
            self.pop_navigation_stack();
        }
    }

    fn apply_search(&mut self) {
        self.store.set_search(self.input_text.clone());
        self.sync_list();
    }

    /// Resume editing after an error raised by a form was dismissed
    fn resume_input(&mut self) {
        if self.get_current_route().active_block == ActiveBlock::Input {
            self.input_mode = InputMode::Editing;
        }
    }

    fn report<R>(&mut self, result: Result<R, TodoError>, success: Option<String>) {
        self.sync_list();

        match result {
            Ok(_) => match self.store.last_error().map(str::to_string) {
                Some(reason) => {
                    self.error_message = format!(
                        "Saved, but the list could not be reloaded: {}\nPress r to retry.",
                        reason
                    );
                    self.push_navigation_stack(RouteId::Error, ActiveBlock::Error);
                }
                None => {
                    if let Some(message) = success {
                        self.handle_new_message(message);
                    }
                }
            },
            Err(e) => self.handle_error(&e),
        }
    }

    pub fn sync_list(&mut self) {
        let items = self.store.page_items().into_iter().cloned().collect();
        self.list.replace(items);
    }
}
