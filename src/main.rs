//! `docstore-mcp` binary: serves the record tools over stdio.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use docstore_mcp::{DatabaseManager, McpServer, McpSession, Result};

/// MCP server exposing CRUD tools over a JSON document store.
#[derive(Parser, Debug)]
#[command(name = "docstore-mcp", version, about)]
struct Args {
    /// Path to the database file
    #[arg(long, default_value = "data/mcp_server.json")]
    db: PathBuf,

    /// Do not insert sample data into empty collections
    #[arg(long)]
    no_seed: bool,

    /// Clear all collections before seeding
    #[arg(long, conflicts_with = "no_seed")]
    reset: bool,

    /// Reject create, update and delete tools
    #[arg(long)]
    read_only: bool,

    /// Log filter (e.g. "debug", "docstore_mcp=trace"); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let manager = Arc::new(DatabaseManager::open(&args.db)?);

    if !args.no_seed {
        let counts = manager.initialize_sample_data(args.reset)?;
        if counts.users + counts.tasks + counts.products > 0 {
            info!(?counts, "Initialized sample data");
        } else {
            info!("Database already contains data, skipping sample data initialization");
        }
    }

    let session = if args.read_only {
        McpSession::read_only(Arc::clone(&manager))
    } else {
        McpSession::new(Arc::clone(&manager))
    };
    let server = McpServer::new(session);
    server.run().await?;
    drop(server);

    if let Ok(manager) = Arc::try_unwrap(manager) {
        manager.close()?;
    }
    Ok(())
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
