//! serenissima - problem detection service for La Serenissima
//!
//! `serve` exposes the detection routes over HTTP; `detect` runs one
//! category (or all of them) once and prints the report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use serenissima::api::create_router;
use serenissima::config::SerenissimaConfig;
use serenissima::problems::{ProblemKind, ProblemService};
use serenissima::state::AppState;
use serenissima::store::{AirtableStore, MemoryStore, TableStore};

#[derive(Parser)]
#[command(name = "serenissima")]
#[command(about = "Detect and track citizen problems in La Serenissima")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind host (default: SERENISSIMA_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (default: SERENISSIMA_PORT or 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Serve an in-memory store seeded from this JSON file instead of Airtable
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Run detection once and print the report
    Detect {
        /// Problem category, or "all"
        category: String,

        /// Only report problems attributed to this citizen
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Detect without writing to the PROBLEMS table
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        fixture: Option<PathBuf>,
    },
}

fn open_store(config: &SerenissimaConfig, fixture: Option<&Path>) -> Result<Arc<dyn TableStore>> {
    match fixture {
        Some(path) => {
            info!("Using in-memory store seeded from {}", path.display());
            let store = MemoryStore::from_fixture(path)
                .with_context(|| format!("failed to load fixture {}", path.display()))?;
            Ok(Arc::new(store))
        }
        None => {
            let airtable = config.airtable().context("Airtable backend selected")?;
            info!("Using Airtable base {}", airtable.base_id);
            Ok(Arc::new(AirtableStore::new(airtable)?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = SerenissimaConfig::from_env();

    match args.command {
        Command::Serve { host, port, fixture } => {
            // CLI > env > defaults
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let store = open_store(&config, fixture.as_deref())?;
            let state = AppState::with_store(store, config.service_settings());
            let app = create_router(state);

            let addr = config.bind_address();
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!("Serenissima problem service listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Command::Detect {
            category,
            username,
            dry_run,
            fixture,
        } => {
            let store = open_store(&config, fixture.as_deref())?;
            let service = ProblemService::new(store, config.service_settings());
            let scope = username.as_deref().map(str::trim).filter(|u| !u.is_empty());

            let report = if category.eq_ignore_ascii_case("all") {
                service.run_all(scope, !dry_run).await?
            } else {
                let kind: ProblemKind = category.parse().map_err(anyhow::Error::msg)?;
                service.run(kind, scope, !dry_run).await?
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
