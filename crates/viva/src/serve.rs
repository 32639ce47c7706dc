// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `viva serve` - wires storage, provider, and webhook pipeline into the gateway.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};
use viva_config::VivaConfig;
use viva_core::{PluginAdapter, StorageAdapter, VivaError};
use viva_elevenlabs::ElevenLabsProvider;
use viva_gateway::{AuthConfig, GatewayState, ServerConfig, start_server};
use viva_storage::SqliteStorage;
use viva_webhook::{CaseReconciler, WebhookProcessor};

/// Runs the server until SIGINT or SIGTERM.
pub async fn run_serve(config: VivaConfig, webhook_secret: SecretString) -> Result<(), VivaError> {
    init_tracing(&config.server.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting viva");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "case store ready");

    let provider = Arc::new(ElevenLabsProvider::new(&config.elevenlabs)?);

    if config.server.api_token.is_none() {
        warn!("server.api_token is not set; the case API will reject every request");
    }

    let storage_dyn: Arc<dyn StorageAdapter> = storage.clone();
    let reconciler = CaseReconciler::new(storage_dyn.clone(), config.webhook.placeholder_owner.clone());
    let processor = WebhookProcessor::new(webhook_secret, provider.clone(), reconciler);

    let state = GatewayState::new(
        storage_dyn,
        Arc::new(processor),
        &config.webhook.signature_header,
        AuthConfig {
            bearer_token: config.server.api_token.clone(),
        },
    )?;

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let served = start_server(&server_config, state, shutdown_signal()).await;

    if let Err(e) = provider.shutdown().await {
        warn!(error = %e, "provider shutdown failed");
    }
    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }

    info!("viva stopped");
    served
}

/// Resolves on the first SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to viva's
/// crates and request tracing, everything else at warn.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("viva={log_level},tower_http={log_level},warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
