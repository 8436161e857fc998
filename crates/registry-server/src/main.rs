// crates/registry-server/src/main.rs
// ============================================================================
// Module: Registry Server Entry Point
// Description: Loads configuration, opens storage, and serves the API.
// Purpose: Binary wrapper around `registry_server::router`.
// Dependencies: registry-auth, registry-config, registry-store-sqlite, tokio
// ============================================================================

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use registry_auth::JwtTokenCodec;
use registry_config::RegistryConfig;
use registry_server::AppState;
use registry_store_sqlite::SqliteStore;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "registry-server exited");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = RegistryConfig::load(None)?;
    let store = SqliteStore::open(Path::new(&config.database_path))?;
    let token_codec = JwtTokenCodec::new(&config.secret_key);

    let state = AppState {
        store: Arc::new(store),
        token_codec: Arc::new(token_codec),
        token_expiry_seconds: config.token_expiry_seconds,
        default_namespace_owner_role: config.default_namespace_owner_role.clone(),
    };

    let app = registry_server::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "registry-server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Resolves once on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            return;
        };
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
