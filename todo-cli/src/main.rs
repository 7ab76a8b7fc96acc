//! todo - command-line client for the todo REST API
//!
//! Every command goes through a `TodoCollection`, so reads after a write are
//! served from the reconciled local copy instead of another list request.
//!
//! # Subcommands
//! - `list [--json]`                 - show all todos, newest first
//! - `get <id> [--json]`             - show one todo
//! - `add <title> [--completed]`     - create a todo
//! - `done <id>` / `undo <id>`       - toggle completion
//! - `rename <id> <title>`           - change the title
//! - `rm <id>`                       - delete a todo
//! - `status`                        - show server health

use clap::{Parser, Subcommand};
use todo_cli::{SyncStrategy, TodoClient, TodoCollection, DEFAULT_SERVER};
use todo_core::Todo;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Command-line client for the todo API")]
struct Cli {
    /// Todo HTTP server URL (overrides TODO_HTTP_URL env var)
    #[arg(long, env = "TODO_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Print todos as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Reload the full list after every write instead of applying the response
    #[arg(long, global = true)]
    refetch: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List all todos, newest first
    List,

    /// Show one todo
    Get { id: i64 },

    /// Create a todo
    Add {
        title: String,

        /// Create it already completed
        #[arg(long)]
        completed: bool,
    },

    /// Mark a todo completed
    Done { id: i64 },

    /// Mark a todo not completed
    Undo { id: i64 },

    /// Change a todo's title
    Rename { id: i64, title: String },

    /// Delete a todo
    Rm { id: i64 },

    /// Show todo server status
    Status,
}

// ============================================================================
// Output
// ============================================================================

fn format_todo(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    format!("[{}] #{:<4} {}", mark, todo.id, todo.title)
}

fn print_todos(todos: &[Todo], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(todos)?);
    } else if todos.is_empty() {
        eprintln!("No todos");
    } else {
        for todo in todos {
            println!("{}", format_todo(todo));
        }
    }
    Ok(())
}

fn print_todo(todo: &Todo, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(todo)?);
    } else {
        println!("{}", format_todo(todo));
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = TodoClient::new(&cli.server)?;
    let strategy = if cli.refetch {
        SyncStrategy::Refetch
    } else {
        SyncStrategy::Reconcile
    };
    let mut todos = TodoCollection::new(client).with_strategy(strategy);

    match cli.command {
        Commands::List => print_todos(&todos.list().await?, cli.json)?,
        Commands::Get { id } => match todos.get(id).await? {
            Some(todo) => print_todo(&todo, cli.json)?,
            None => anyhow::bail!("todo {} not found", id),
        },
        Commands::Add { title, completed } => {
            let todo = todos.create(&title, completed).await?;
            print_todo(&todo, cli.json)?;
        }
        Commands::Done { id } => print_todo(&todos.set_completed(id, true).await?, cli.json)?,
        Commands::Undo { id } => print_todo(&todos.set_completed(id, false).await?, cli.json)?,
        Commands::Rename { id, title } => print_todo(&todos.rename(id, &title).await?, cli.json)?,
        Commands::Rm { id } => {
            todos.delete(id).await?;
            if !cli.json {
                println!("Deleted #{}", id);
            }
        }
        Commands::Status => {
            let body = todos.client().health().await?;
            println!("Todo server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:     {}", body["version"].as_str().unwrap_or("?"));
            println!("Backend:     {}", body["backend"].as_str().unwrap_or("?"));
            println!("Database:    {}", body["database"].as_str().unwrap_or("?"));
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("todo: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
