// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, process::ExitCode, sync::Arc, time::Duration};

use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use genomic_custody_server::{
    api::router,
    blockchain::{CustodyKey, EvmLedgerClient, LedgerClient, LedgerCommitOrchestrator, SubmissionQueue},
    config::{Config, KeySource, LogFormat, DEFAULT_LOG_FILTER},
    pipeline::CustodyPipeline,
    state::AppState,
    storage::CustodyDatabase,
};

/// Grace period for in-flight requests after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn load_key(source: &KeySource) -> Result<CustodyKey, Box<dyn Error>> {
    let key = match source {
        KeySource::Hex(hex) => CustodyKey::from_hex(hex)?,
        KeySource::PemFile(path) => CustodyKey::from_pem(&std::fs::read(path)?)?,
    };
    Ok(key)
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let key = Arc::new(load_key(&config.key_source)?);
    tracing::info!(account = %key.address(), "Custodial key loaded");

    let db = Arc::new(CustodyDatabase::open_in(&config.data_dir)?);

    let client: Arc<dyn LedgerClient> = Arc::new(
        EvmLedgerClient::connect(config.network.clone(), &key, config.poll_interval).await?,
    );

    // Signals cancel the server's child token only. The writer stops once
    // `serve` returns so draining uploads can still confirm.
    let queue_shutdown = CancellationToken::new();
    let shutdown = queue_shutdown.child_token();
    let queue = SubmissionQueue::spawn(client.clone(), queue_shutdown.clone());

    let mut orchestrator =
        LedgerCommitOrchestrator::new(client, queue, config.controller, config.finality_timeout);
    if let Some(token) = config.reward_token {
        orchestrator = orchestrator.with_reward_token(token);
    }
    let orchestrator = Arc::new(orchestrator);

    let pipeline = CustodyPipeline::new(db.clone(), db.clone(), orchestrator.clone(), key)
        .with_journal(db.clone());

    let state = AppState::new(Arc::new(pipeline), orchestrator, db.clone(), db)
        .with_data_dir(config.data_dir.clone());
    let app = router(state);

    tokio::spawn(watch_signals(shutdown.clone()));

    let addr = config.bind_addr;
    match &config.tls {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            let handle = axum_server::Handle::new();

            let on_shutdown = handle.clone();
            let token = shutdown.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                on_shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            tracing::info!(%addr, "Genomic custody server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "Genomic custody server listening on http (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .await?;
        }
    }

    queue_shutdown.cancel();
    tracing::info!("Server stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
