//! `holdfast-server`: runs a Holdfast game server.
//!
//! Settings come from the environment (see [`ServerConfig::from_env`]);
//! log verbosity from `RUST_LOG` (default `info`).

use holdfast::{HoldfastError, HoldfastServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), HoldfastError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let server = HoldfastServer::builder().config(config).build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
