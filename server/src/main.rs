//! API server: loads settings and the catalog, opens the shared store connection, serves until signalled.
//!
//! Run from repo root: `cargo run -p videogames-server`

use std::time::Duration;
use tokio::net::TcpListener;
use videogames_api::{app, default_catalog, load_catalog_from_path, resolve, store, AppState, CrudService, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("videogames_api=info,videogames_server=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let catalog = match &settings.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading catalog");
            load_catalog_from_path(path).await?
        }
        None => default_catalog()?,
    };
    let model = resolve(&catalog)?;
    tracing::info!(resources = model.entities.len(), "catalog resolved");

    let acquire_timeout = settings.query_timeout.max(Duration::from_secs(1));
    let pool = store::connect(&settings.database_url, acquire_timeout).await?;
    let state = AppState::new(CrudService::new(pool.clone(), settings.query_timeout), model);

    let router = app(state, &settings);
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store::close(&pool).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
