//! CLI entry point for todo-reminder.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use todo_reminder_app::{AppConfig, ReminderService, TaskService};
use todo_reminder_mail::SmtpMailer;
use todo_reminder_store_sqlite::SqliteStore;

mod commands;
mod cookies;
mod form;
mod server;

/// To-do list with soft delete and mail reminders.
#[derive(Parser, Debug)]
#[command(
    name = "todo-reminder",
    version,
    about = "todo-reminder: a single-user to-do list that mails you what is still open"
)]
struct Cli {
    /// TOML configuration file; environment variables override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address, overriding the configuration.
        #[arg(long)]
        listen: Option<String>,
    },

    /// List todos.
    Ls {
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Create a todo.
    Add {
        #[arg(long)]
        content: String,
        /// Deadline as YYYY-MM-DDTHH:MM in the configured offset.
        #[arg(long)]
        until: Option<String>,
    },

    /// Mark a todo done (or open again with --undo).
    Done {
        #[arg(long)]
        id: String,
        #[arg(long)]
        undo: bool,
    },

    /// Delete a todo.
    Rm {
        #[arg(long)]
        id: String,
    },

    /// Show a todo, including deleted ones.
    Show {
        #[arg(long)]
        id: String,
    },

    /// Mail the reminder digest once.
    Notify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let Cli { config, cmd } = Cli::parse();
    install_tracing();

    let mut config = AppConfig::load(config.as_deref())?;
    if let Command::Serve {
        listen: Some(listen),
    } = &cmd
    {
        config.listen.clone_from(listen);
        config.validate()?;
    }
    execute_command(&config, cmd)
}

fn execute_command(config: &AppConfig, command: Command) -> Result<()> {
    let path = config.database_path()?;
    let store = Arc::new(
        SqliteStore::open(&path).with_context(|| format!("failed to open database {}", path.display()))?,
    );
    let transport = Arc::new(SmtpMailer::new(config.mail.clone()));

    match command {
        Command::Serve { .. } => {
            if let Err(err) = config.mail.validate() {
                warn!(error = %err, "mail settings incomplete; reminders will fail");
            }
            let state = server::AppState::new(store, transport, config)?;
            let addr = config.listen_addr()?;
            tokio::runtime::Runtime::new()?.block_on(async move {
                let listener = tokio::net::TcpListener::bind(addr)
                    .await
                    .with_context(|| format!("failed to bind {addr}"))?;
                server::serve(listener, state).await
            })
        }
        other => {
            let tasks = TaskService::new(store);
            let reminder = ReminderService::new(
                tasks.clone(),
                transport,
                config.mail.clone(),
                config.reminder_config()?,
            );
            commands::run(other, &tasks, &reminder, config.offset()?)
        }
    }
}

fn install_tracing() {
    // RUST_LOG overrides the default INFO level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
