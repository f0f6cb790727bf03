// Points API Service - HTTP entry point for the points ledger

use anyhow::Context;
use points_ledger::{Config, Ledger, LogFormat};
use points_api::{router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn load_config() -> anyhow::Result<Config> {
    let config = match std::env::var("POINTS_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        Err(_) => Config::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(config.log_format);

    info!(
        "Starting {} v{}",
        config.service_name, config.service_version
    );

    let bind_addr = config.http_listen_addr.clone();
    let ledger = Ledger::open(config).await?;
    let app = router(AppState::new(ledger.clone()));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Running Points API at http://{}/", bind_addr);
    info!("   GET  /status - Liveness probe");
    info!("   POST /points/user/:user/transaction - Add a transaction");
    info!("   GET  /points/user/:user/balances - Per-payer balances");
    info!("   POST /points/user/:user/spend - Spend points, oldest first");
    info!("   POST /points/user/:user/plan - Preview a spend");
    info!("   GET  /metrics - Prometheus metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Shutting down points server");
    ledger.shutdown().await?;
    Ok(())
}
