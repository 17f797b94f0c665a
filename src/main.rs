// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use idgraph_enclave::config::{CoreConfig, LogFormat};
use idgraph_enclave::crypto::SealedEnclaveKey;
use idgraph_enclave::host::HostChannel;
use idgraph_enclave::parentchain::ImportedHeight;
use idgraph_enclave::verify::NoDataProvider;
use idgraph_enclave::worker::Worker;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    // stdout carries responses to the host; logs go to stderr.
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match LogFormat::from_env() {
        LogFormat::Json => registry.with(layer.json()).init(),
        LogFormat::Pretty => registry.with(layer).init(),
    }

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let enclave_key = match config.enclave_seed {
        Some(seed) => SealedEnclaveKey::from_seed(seed),
        None if cfg!(feature = "dev") => {
            warn!("ENCLAVE_SEED not set, using a random enclave key (dev only)");
            SealedEnclaveKey::generate()
        }
        None => {
            error!("ENCLAVE_SEED is required");
            std::process::exit(1);
        }
    };

    // Calls fail until the host reports the first parentchain block.
    let height = Arc::new(ImportedHeight::default());
    let worker = Worker::from_config(
        &config,
        Arc::new(enclave_key),
        Arc::new(NoDataProvider),
        height.clone(),
    );
    info!(
        shard = %worker.shard(),
        enclave_account = %worker.enclave_account(),
        shielding_key = ?worker.shielding_key(),
        policy = ?config.policy,
        "identity core initialized"
    );

    let channel = HostChannel::new(Arc::new(worker), height);
    tokio::select! {
        result = channel.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => {
            match result {
                Ok(()) => info!("host channel closed"),
                Err(e) => {
                    error!(error = %e, "host channel failed");
                    std::process::exit(1);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }
}
