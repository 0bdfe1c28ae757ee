use dotenvy::dotenv;
use schoolhub::router::init_router;
use schoolhub::state::init_app_state;
use schoolhub_config::ServerConfig;
use schoolhub_observability::{init_metrics, init_tracing, metrics_app, shutdown_tracer};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let server_config = ServerConfig::from_env();
    let state = init_app_state().await?;

    if server_config.run_migrations {
        info!("Running database migrations");
        schoolhub_db::run_migrations(&state.db).await?;
    }

    if let Some(handle) = init_metrics()? {
        let metrics_address = server_config.metrics_address();
        let listener = TcpListener::bind(&metrics_address).await?;
        info!(address = %metrics_address, "Metrics endpoint listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let app = init_router(state);
    let address = server_config.address();
    let listener = TcpListener::bind(&address).await?;

    info!(address = %address, "Server running");
    info!("Scalar UI available at http://{}/scalar", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
