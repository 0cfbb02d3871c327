mod config;
mod error;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scheme_common::groq::GroqClient;

use config::Config;
use server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env()?;
    info!(
        base_url = %config.groq.base_url,
        model = %config.groq.model,
        timeout_ms = config.groq.timeout.as_millis(),
        static_root = %config.static_root.display(),
        "groq proxy configured"
    );

    let groq = match config.api_key.clone() {
        Some(key) => Some(Arc::new(GroqClient::new(config.groq.clone(), key)?)),
        None => {
            warn!("GROQ_API_KEY not set, /api/chat will answer 500 until it is configured");
            None
        }
    };

    let router = build_router(AppState { groq }, &config.static_root);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
