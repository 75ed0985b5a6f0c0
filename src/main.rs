use clap::{Parser, Subcommand};

use config::Config;
use store::StatusFilter;
use todo_commands::ListOptions;

mod api;
mod config;
mod dates;
mod errors;
mod models;
mod store;
mod todo_commands;
mod ui;
mod utils;

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Ui,
    Login,
    Logout,
    #[clap(alias = "ls")]
    List {
        /// all, active or completed
        #[clap(short, long, default_value = "all")]
        filter: StatusFilter,

        /// Only todos whose title or description contains this text
        #[clap(short, long)]
        search: Option<String>,

        #[clap(short, long, default_value_t = 1)]
        page: usize,

        #[clap(long = "page-size")]
        page_size: Option<usize>,
    },
    #[clap(alias = "c")]
    Create {
        #[clap(short, long)]
        title: Option<String>,

        #[clap(short, long)]
        description: Option<String>,
    },
    Edit {
        id: i64,

        #[clap(short, long)]
        title: Option<String>,

        #[clap(short, long)]
        description: Option<String>,
    },
    /// Flip a todo between open and done
    Toggle { id: i64 },
    #[clap(alias = "rm")]
    Delete {
        id: i64,

        /// Do not ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
    /// Check whether the backend is reachable
    Health {
        #[clap(short, long)]
        watch: bool,
    },
}

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = "Manage todos from the terminal")]
struct TodoArgs {
    /// Overrides the configured api url
    #[clap(long = "api-url")]
    api_url: Option<String>,

    #[clap(subcommand)]
    command: Option<Commands>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = TodoArgs::parse();

    let mut config = Config::load()?;

    if let Some(api_url) = &args.api_url {
        config.api_url = config::normalize_api_url(api_url);
    }

    log::debug!("Using backend at {}", config.api_url);

    match args.command.unwrap_or(Commands::Ui) {
        Commands::Ui => todo_commands::open_dashboard(&config),
        Commands::Login => todo_commands::login(&config),
        Commands::Logout => todo_commands::logout(&config),
        Commands::List {
            filter,
            search,
            page,
            page_size,
        } => todo_commands::list_todos(
            &config,
            ListOptions {
                filter,
                search,
                page,
                page_size,
            },
        ),
        Commands::Create { title, description } => {
            todo_commands::create_todo(&config, title, description)
        }
        Commands::Edit {
            id,
            title,
            description,
        } => todo_commands::edit_todo(&config, id, title, description),
        Commands::Toggle { id } => todo_commands::toggle_todo(&config, id),
        Commands::Delete { id, yes } => todo_commands::delete_todo(&config, id, yes),
        Commands::Health { watch } => todo_commands::health(&config, watch),
    }
}
