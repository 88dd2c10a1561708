// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kab::config::Config;
use kab::events::ChannelEventSource;
use kab::kubernetes::{create_client, KubePodClient};
use kab::metrics::BackupMetrics;
use kab::operator::Operator;
use kab::reconcilers::PodReconciler;
use kab::scheduler::DaemonManager;
use kab::webhook::{serve_metrics, serve_webhook};

#[tokio::main]
async fn main() -> Result<()> {
    // rustls needs a process-wide crypto provider before kube or axum-server build a TLS config
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        anyhow::bail!("Failed to install rustls crypto provider: {:?}", e);
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting kab operator");

    let config = Config::from_env()?;
    match &config.nfs {
        Some(nfs) => info!(
            "Configuration loaded: nfs_server={}, nfs_root_path={}",
            nfs.server, nfs.root_path
        ),
        None => warn!("NFS_SERVER/NFS_ROOT_PATH not set, annotated pods will be denied"),
    }

    let client = create_client(&config).await?;
    info!("Connected to Kubernetes cluster");

    let metrics = BackupMetrics::new()?;
    let (source, events) = ChannelEventSource::new();

    let manager = DaemonManager::new(Arc::new(KubePodClient::new(client.clone())), metrics.clone());
    let operator = Operator::new(source, manager, config.nfs.clone());
    let pod_reconciler = PodReconciler::new(client, events.clone());

    info!("Starting operator, watcher and servers...");

    tokio::try_join!(
        operator.run(),
        pod_reconciler.run(),
        async {
            serve_webhook(
                config.webhook_addr,
                &config.webhook_cert_file,
                &config.webhook_key_file,
                events,
            )
            .await
            .context("Admission webhook server failed")
        },
        async {
            serve_metrics(config.metrics_addr, metrics)
                .await
                .context("Metrics server failed")
        }
    )?;

    // This should never be reached as the watcher and servers run forever
    warn!("All components stopped unexpectedly");
    Ok(())
}
