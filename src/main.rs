use clap::Parser;
use corkboard::{
    Application,
    config::{Args, Config},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,corkboard=debug")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(&args).map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    if args.validate {
        println!("Configuration is valid");
        return Ok(());
    }

    let app = Application::new(config).await?;
    app.serve(shutdown_signal()).await
}
