use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pisalist_server::{api, AppState, ServerConfig};
use pisalist_shared::token::TokenSigner;
use pisalist_store::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,pisalist_server=debug,pisalist_core=debug")
            }),
        )
        .init();

    info!("Starting PisaList server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    // -----------------------------------------------------------------------
    // 3. Open the store and seed the community pool
    // -----------------------------------------------------------------------
    let db = Arc::new(Database::open_at(&config.database_path)?);
    if config.seed_community {
        let seeded = db.seed_community()?;
        if seeded == 0 {
            info!("Community pool already populated");
        }
    }

    let signer = TokenSigner::from_secret(config.token_secret.as_bytes(), config.token_ttl);
    let app_state = AppState::new(db, signer);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
