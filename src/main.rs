mod app;
mod handlers;
mod models;
mod repository;
mod services;
mod utils;

use anyhow::{bail, Context};
use app::config::{Cli, Config, StorageBackend};
use clap::Parser;
use handlers::AppState;
use repository::{postgres, InMemoryPaymentRepository, PaymentRepository, PgPaymentRepository};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::logging::init();

    let cli = Cli::parse();
    let config = Config::load(&cli);
    info!("Starting {} with {:?} storage", config.app_name, config.storage);

    let repository: Arc<dyn PaymentRepository> = match config.storage {
        StorageBackend::Postgres => {
            let pool = postgres::connect(&config)
                .await
                .context("error when connecting to postgres")?;
            postgres::migrate(&pool)
                .await
                .context("error when migrating the database schema")?;
            Arc::new(PgPaymentRepository::new(pool))
        }
        StorageBackend::Memory => Arc::new(InMemoryPaymentRepository::new()),
    };

    let state = AppState::build(repository, &config);
    let ops = handlers::ops_router(state.metrics.clone());
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.app_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!("The {} has started on {}", config.app_name, addr);

    let ops_addr = format!("0.0.0.0:{}", config.ops_port);
    let ops_listener = TcpListener::bind(&ops_addr)
        .await
        .with_context(|| format!("cannot bind {ops_addr}"))?;
    info!("The ops server has started on {}", ops_addr);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });
    let mut ops_server = tokio::spawn(async move { axum::serve(ops_listener, ops).await });

    tokio::select! {
        result = &mut server => {
            result.context("server task failed")?.context("server error")?;
            bail!("server stopped unexpectedly");
        }
        result = &mut ops_server => {
            result.context("ops server task failed")?.context("ops server error")?;
            bail!("ops server stopped unexpectedly");
        }
        _ = app::shutdown::signal() => {
            info!("Shutting down, draining in-flight requests");
            stop_tx.send(()).ok();

            match tokio::time::timeout(config.shutdown_timeout(), &mut server).await {
                Ok(result) => {
                    result.context("server task failed")?.context("server error")?;
                }
                Err(_) => warn!(
                    "Could not stop the http server gracefully within {:?}",
                    config.shutdown_timeout()
                ),
            }
            ops_server.abort();
        }
    }

    info!("Shutdown successful");
    Ok(())
}
