// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};

use secret_rollout::config::Config;
use secret_rollout::reconcilers::SecretReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting secret-rollout operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, max_concurrent_updates={:?}, list_page_size={}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.max_concurrent_updates,
        config.list_page_size
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let secret_reconciler = SecretReconciler::new(client, config);

    info!("Starting secret reconciler...");
    secret_reconciler.run().await?;

    // This should never be reached as the reconciler runs forever
    warn!("Secret reconciler stopped unexpectedly");
    Ok(())
}
