mod config;
mod telemetry;

use std::time::Duration;

use clap::Parser;
use config::Settings;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let settings = Settings::parse();
    telemetry::init(settings.debug_mode, settings.json_logs);

    let app_config = settings.app_config()?;
    let ctx = api::init_app(app_config).await?;

    let listener = TcpListener::bind(&settings.listen_addr).await?;
    tracing::info!("Listening on {}", settings.listen_addr);

    axum::serve(listener, api::routes::router(ctx.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ctx.shutdown(Duration::from_secs(settings.job_timeout_secs)).await;
    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Could not listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
