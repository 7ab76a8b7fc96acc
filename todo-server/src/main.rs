use std::sync::Arc;

use clap::Parser;
use todo_core::{MemoryTodoStore, PgTodoStore, StoreBackend, TodoConfig, TodoStore};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use todo_server::http;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "todo.toml")]
    config: String,

    /// Check the configured store and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match TodoConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level)),
        )
        .init();

    let store: Arc<dyn TodoStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = match todo_core::db::create_pool(&config.database).await {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Failed to connect to database: {}", e);
                    std::process::exit(1);
                }
            };
            if config.database.run_migrations {
                todo_core::db::run_migrations(&pool).await?;
            }
            Arc::new(PgTodoStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; todos are lost on exit");
            Arc::new(MemoryTodoStore::new())
        }
    };

    if args.health {
        match store.health().await {
            Ok(v) => println!("✅ {} store reachable: {}", store.name(), v),
            Err(e) => {
                println!("❌ {} store check failed: {}", store.name(), e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(store, config, tx.subscribe()).await
}
