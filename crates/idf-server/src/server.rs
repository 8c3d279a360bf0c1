//! Process lifecycle: open storage, serve, drain, close

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;
use anyhow::Context;
use idf_store::{MemStore, PgStore, Store};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Serve until Ctrl-C or SIGTERM
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let verifier = Arc::new(config.identity.verifier()?);

    let pg = if config.in_memory {
        None
    } else {
        let options = config.database.connect_options();
        info!(host = %options.host, database = %options.database, "Connecting to database...");
        let store = PgStore::connect(&options)
            .await
            .context("failed to connect to database")?;
        store.migrate().await.context("failed to run migrations")?;
        Some(Arc::new(store))
    };
    let store: Arc<dyn Store> = match &pg {
        Some(pg) => Arc::clone(pg) as Arc<dyn Store>,
        None => {
            warn!("Using in-memory store, data is lost on exit");
            Arc::new(MemStore::new())
        }
    };

    let app = routes::app(AppState::new(store, verifier), config.static_dir.as_deref());

    let address = config.bind_address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pg) = pg {
        pg.close().await;
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
