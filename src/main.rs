use folio::FolioError;
use folio::config::Config;
use folio::db::ConnectionManager;
use folio::server::router::{FolioState, folio_router};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), FolioError> {
    let cfg = Config::load()?;
    folio::utils::logging::init_tracing(&cfg.basic.loglevel);

    info!(
        listen_addr = %cfg.basic.listen_addr,
        listen_port = cfg.basic.listen_port,
        loglevel = %cfg.basic.loglevel,
        local_url = %cfg.database.local_url,
        remote_configured = cfg.database.remote_url().is_some(),
        "Starting folio"
    );
    if cfg.basic.admin_key().is_empty() {
        warn!("basic.admin_key is empty; admin endpoints will reject every request");
    }

    let db = ConnectionManager::initialize(&cfg.database).await?;
    info!(backend = ?db.backend().await, "Database ready");

    let admin_key: Arc<str> = Arc::from(cfg.basic.admin_key());
    let app = folio_router(FolioState::new(db.clone(), admin_key));

    let addr = cfg.basic.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.shutdown().await;
    info!("Server has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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
