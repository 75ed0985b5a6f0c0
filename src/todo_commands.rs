use std::time::Instant;

use inquire::{Confirm, Password, Text};

use crate::{
    api::{
        client::ApiClient,
        health::{HealthMonitor, HealthStatus, HealthWatcher},
        transport::{HttpTransport, Transport},
    },
    config::Config,
    dates,
    errors::TodoError,
    models::todo_model::{Todo, TodoForm},
    store::{StatusFilter, TodoStore},
    ui::{app::App, todo_list_renderer::run_dashboard},
    utils::CredentialStore,
};

/// Options of the `list` subcommand
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub filter: StatusFilter,
    pub search: Option<String>,
    pub page: usize,
    pub page_size: Option<usize>,
}

pub fn connect(config: &Config) -> Result<ApiClient<HttpTransport>, TodoError> {
    let transport = HttpTransport::new(config.request_timeout)?;
    let credentials = CredentialStore::new(config.credentials_path.clone());

    Ok(ApiClient::new(&config.api_url, transport, credentials))
}

/// Open the interactive dashboard
pub fn open_dashboard(config: &Config) -> anyhow::Result<()> {
    let store = TodoStore::new(connect(config)?, config.page_size);
    let health = HealthWatcher::spawn(connect(config)?, config.health_interval);
    let app = App::new(store, health);

    run_dashboard(app, std::time::Duration::from_millis(250))
}

/// Prompt for credentials and log in
pub fn login(config: &Config) -> anyhow::Result<()> {
    let client = connect(config)?;

    println!("Login to {}", client.base_url());

    let email = Text::new("Email").with_help_message("Enter Email").prompt()?;

    let password = Password::new("Password").prompt()?;

    client.login(&email, &password)?;

    println!("You are now logged in");

    Ok(())
}

pub fn logout(config: &Config) -> anyhow::Result<()> {
    let client = connect(config)?;
    client.logout()?;

    println!("Logged out, removed {}", client.credentials().path().display());

    Ok(())
}

/// List todos for the user, one page at a time
pub fn list_todos(config: &Config, options: ListOptions) -> anyhow::Result<()> {
    let mut store = TodoStore::new(connect(config)?, config.page_size);

    store.refresh()?;

    print!("{}", render_page(&mut store, &options));

    Ok(())
}

/// Plain text rendering of the requested page
fn render_page<T: Transport>(store: &mut TodoStore<T>, options: &ListOptions) -> String {
    store.set_filter(options.filter);
    if let Some(search) = &options.search {
        store.set_search(search.as_str());
    }
    if let Some(page_size) = options.page_size {
        store.set_page_size(page_size);
    }
    store.set_page(options.page);

    let mut out = String::new();

    let items = store.page_items();
    if items.is_empty() {
        out.push_str("No todos found\n");
    }

    for todo in items {
        out.push_str(&format_line(todo));
        out.push('\n');
    }

    out.push_str(&format!(
        "Page {}/{} ({} of {} todos, filter: {})\n",
        store.page(),
        store.total_pages(),
        store.filtered().len(),
        store.counts().all,
        store.filter().label().to_lowercase()
    ));

    out
}

fn format_line(todo: &Todo) -> String {
    let marker = if todo.completed { "[x]" } else { "[ ]" };

    let mut line = format!(
        "{} #{:<4} {}  ({})",
        marker,
        todo.id,
        todo.title,
        dates::format_local(&todo.created_at)
    );

    if let Some(description) = &todo.description {
        line.push_str(&format!("\n           {}", description));
    }

    line
}

/// Prompt for a form until it validates
fn prompt_form(defaults: &TodoForm) -> anyhow::Result<TodoForm> {
    loop {
        let title = Text::new("Title")
            .with_default(defaults.title.as_str())
            .with_help_message("Title for your todo")
            .prompt()?;

        let description = Text::new("Description")
            .with_default(defaults.description.as_str())
            .with_help_message("Optional, press enter to skip")
            .prompt()?;

        let form = TodoForm::new(title, description);

        match form.validate() {
            Ok(_) => return Ok(form),
            Err(errors) => {
                eprintln!("{}", errors);

                if !Confirm::new("Try again").with_default(true).prompt()? {
                    return Err(TodoError::Validation(errors).into());
                }
            }
        }
    }
}

/// Create a todo, prompting for any field not given on the command line
pub fn create_todo(
    config: &Config,
    title: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let form = match title {
        Some(title) => TodoForm::new(title, description.unwrap_or_default()),
        None => prompt_form(&TodoForm::new(
            String::new(),
            description.unwrap_or_default(),
        ))?,
    };

    let client = connect(config)?;
    let created = client.create_todo(&form.validate()?)?;

    println!("Created {}", format_line(&created));

    Ok(())
}

pub fn edit_todo(
    config: &Config,
    id: i64,
    title: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let client = connect(config)?;
    let current = client.get_todo(id)?;

    let mut form = TodoForm::from_todo(&current);

    if title.is_none() && description.is_none() {
        form = prompt_form(&form)?;
    } else {
        if let Some(title) = title {
            form.title = title;
        }
        if let Some(description) = description {
            form.description = description;
        }
    }

    let updated = client.update_todo(id, &form.validate()?)?;

    println!("Updated {}", format_line(&updated));

    Ok(())
}

pub fn toggle_todo(config: &Config, id: i64) -> anyhow::Result<()> {
    let client = connect(config)?;
    let current = client.get_todo(id)?;

    let toggled = client.toggle_todo(id, !current.completed)?;

    println!("{}", format_line(&toggled));

    Ok(())
}

pub fn delete_todo(config: &Config, id: i64, skip_confirm: bool) -> anyhow::Result<()> {
    let client = connect(config)?;

    if !skip_confirm {
        let todo = client.get_todo(id)?;
        let confirmed = Confirm::new(&format!("Delete \"{}\"?", todo.title))
            .with_default(false)
            .prompt()?;

        if !confirmed {
            println!("Nothing deleted");
            return Ok(());
        }
    }

    client.delete_todo(id)?;

    println!("Todo Item Deleted");

    Ok(())
}

/// Check the backend once, or keep checking every health interval
pub fn health(config: &Config, watch: bool) -> anyhow::Result<()> {
    let client = connect(config)?;
    let mut monitor = HealthMonitor::new(config.health_interval);

    loop {
        let status = monitor.check(&client, Instant::now()).clone();

        println!(
            "{}  {} is {}",
            chrono::Local::now().format("%H:%M:%S"),
            client.base_url(),
            status
        );

        if !watch {
            if let HealthStatus::Offline(reason) = status {
                anyhow::bail!("backend is offline: {}", reason);
            }
            return Ok(());
        }

        std::thread::sleep(monitor.interval());
    }
}
