// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use cab_wallet_server::{
    api::router,
    config::{AppConfig, TlsPaths},
    init_tracing,
    state::AppState,
};
use tracing::{error, info};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Must precede any TLS use, including outbound RPC over HTTPS.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err("failed to install rustls crypto provider".into());
    }

    let state = AppState::from_config(&config)?;
    let app = router(state).into_make_service();
    let addr = config.bind_addr;

    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

    info!(
        %addr,
        fee_buffer = %config.fee_buffer,
        chains = ?config.rpc_urls.keys().collect::<Vec<_>>(),
        "CAB wallet server starting (docs at /docs)"
    );

    match config.tls {
        Some(TlsPaths { cert, key }) => {
            let tls = RustlsConfig::from_pem_file(cert, key).await?;
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app)
                .await?;
        }
        None => {
            axum_server::bind(addr).handle(handle).serve(app).await?;
        }
    }

    info!("server stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: Handle<std::net::SocketAddr>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
