use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use whois_history::config::{AppConfig, USAGE};
use whois_history::history::engine::HistoryEngine;
use whois_history::history::handlers::handle_get_domain_history;
use whois_history::ingestion::handlers::handle_ingest;
use whois_history::ingestion::ingestor::Ingestor;
use whois_history::ingestion::source::DelimitedSource;
use whois_history::storage::handlers::handle_health;
use whois_history::storage::memory::MemoryStore;
use whois_history::storage::provisioner::{DEFAULT_INDEXED_FIELDS, IndexProvisioner};
use whois_history::storage::store::SharedStore;

const INGEST_BODY_LIMIT: usize = 256 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match AppConfig::from_args(&args[1..]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    // 1. Storage handle, shared by every component:
    let store: SharedStore = Arc::new(MemoryStore::new());

    // 2. Index bootstrap:
    if config.provision_indexes {
        let provisioner = match config.index_workers {
            Some(workers) => IndexProvisioner::new(store.clone(), workers),
            None => IndexProvisioner::with_available_parallelism(store.clone()),
        };
        let report = provisioner.ensure_indexes(&DEFAULT_INDEXED_FIELDS).await;
        if !report.is_complete() {
            for outcome in report.failed() {
                tracing::error!("Index on {} missing: {:?}", outcome.field, outcome.status);
            }
            tracing::warn!("Continuing without all indexes; lookups fall back to scans");
        }
    }

    // 3. Startup ingestion:
    for path in &config.csv_files {
        let ingestor = Ingestor::new(store.clone(), config.ingest_options())?;
        let source = DelimitedSource::open(path, config.delimiter)?;

        let progress = ingestor.progress();
        let reporter = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(5));
            loop {
                interval.tick().await;
                tracing::info!("Ingest progress: {} rows", progress.rows_processed());
            }
        });

        tracing::info!("Ingesting {}", path.display());
        let result = ingestor.ingest(source).await;
        reporter.abort();

        let summary = result?;
        tracing::info!(
            "Ingested {}: {}",
            path.display(),
            serde_json::to_string(&summary)?
        );
    }

    if !config.serve {
        return Ok(());
    }

    // 4. HTTP Router:
    let engine = Arc::new(HistoryEngine::new(store.clone()));

    let app = Router::new()
        .route("/get_domain_history", post(handle_get_domain_history))
        .route(
            "/ingest",
            post(handle_ingest).layer(DefaultBodyLimit::max(INGEST_BODY_LIMIT)),
        )
        .route("/health", get(handle_health))
        .layer(Extension(engine))
        .layer(Extension(store));

    // 5. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
