use anyhow::Context;
use clap::Parser;
use gitdocify::config::Settings;
use gitdocify::database::{MemoryStore, PgStore, Store};
use gitdocify::{create_app, db, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Parser)]
#[command(name = "gitdocify", version, about = "Generate Markdown documentation for GitHub repositories")]
struct Cli {
    /// Override LISTEN_ADDRESS
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gitdocify=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings = Settings::load().context("Failed to load application settings")?;
    if let Some(listen) = cli.listen {
        settings.server.listen_address = listen;
        settings
            .validate_all()
            .context("Invalid --listen address")?;
    }

    for name in settings.missing_integrations() {
        warn!("{} is not set; related features are unavailable", name);
    }

    let store: Arc<dyn Store> = match &settings.database {
        Some(database) => {
            let pool = db::create_pool(database).await?;
            info!("Database pool established with {} max connections", database.max_connections);
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL is not set, documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let listen_address = settings.server.listen_address.clone();
    let state = AppState::from_settings(settings, store)?;
    start_background_tasks(&state);

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&listen_address)
        .await
        .context("Failed to bind to server address")?;
    info!("Listening on {}", listen_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown completed");
    Ok(())
}

fn start_background_tasks(state: &AppState) {
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            limiter.prune();
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
