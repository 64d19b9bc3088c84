use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use leadsignal_server::state::AppState;

/// `leadsignal health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$LEADSIGNAL_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("LEADSIGNAL_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("leadsignal=info".parse()?),
        )
        .json()
        .init();

    let cfg = leadsignal_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/leadsignal.db", cfg.data_dir);
    let db = leadsignal_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let state = Arc::new(AppState::new(db, cfg.clone()));

    match cfg.evaluate_interval() {
        Some(period) => {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                leadsignal_server::scheduler::run_scheduler_loop(state, period).await;
            });
        }
        None => info!("Scheduled evaluation disabled (LEADSIGNAL_EVALUATE_INTERVAL_SECONDS=0)"),
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = leadsignal_server::app::build_app(Arc::clone(&state));

    info!(
        port = cfg.port,
        campaign_start = %cfg.campaign_start,
        campaign_timezone = %cfg.campaign_timezone,
        "Leadsignal listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
