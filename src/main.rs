use hiring_portal::{
    config::init_config,
    database::{
        pool::{create_pool, run_migrations},
        PgStore, SharedStore,
    },
    routes, AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("Shutdown requested");
    cancel.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = init_config()?;
    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    info!("Database migrations applied");

    let store: SharedStore = Arc::new(PgStore::new(pool));
    let (app_state, worker) = AppState::new(store, config)?;
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; AI features will fail per request");
    }

    let cancel = CancellationToken::new();
    let worker_handle = tokio::spawn(worker.run(cancel.clone()));

    let app = routes::router(app_state, config);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "AI analysis worker panicked");
    }
    Ok(())
}
