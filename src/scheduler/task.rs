// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The per-Pod backup daemon.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::backup::{select_main_container, BackupConfig};
use crate::error::{KabError, Result};
use crate::events::PodKey;
use crate::kubernetes::PodOperations;
use crate::metrics::{BackupLabels, BackupMetrics};
use crate::scheduler::readiness::{wait_for_ready, Readiness};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    WaitingForReady,
    Running,
    Stopped,
}

/// Waits for one Pod to become ready, then runs its backup command on schedule until cancelled
pub struct PodTask {
    key: PodKey,
    pod: Pod,
    pods: Arc<dyn PodOperations>,
    metrics: BackupMetrics,
    cancel: CancellationToken,
    state: TaskState,
    labels: Option<BackupLabels>,
}

impl PodTask {
    pub fn new(
        pod: Pod,
        pods: Arc<dyn PodOperations>,
        metrics: BackupMetrics,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            key: PodKey::from_pod(&pod),
            pod,
            pods,
            metrics,
            cancel,
            state: TaskState::WaitingForReady,
            labels: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Metric labels of the backups this task ran, once its settings are resolved
    pub fn labels(&self) -> Option<&BackupLabels> {
        self.labels.as_ref()
    }

    /// Drive the task until cancellation.
    ///
    /// Returns an error only when the backup settings cannot be resolved, in which case
    /// no backup was executed and the caller decides when to try again.
    #[instrument(skip(self), fields(pod = %self.key))]
    pub async fn run(&mut self) -> Result<()> {
        self.state = TaskState::WaitingForReady;

        if wait_for_ready(self.pods.as_ref(), &self.key, &self.cancel).await == Readiness::Cancelled {
            self.state = TaskState::Stopped;
            return Ok(());
        }

        let (config, container) = match self.resolve() {
            Ok(resolved) => resolved,
            Err(e) => {
                self.state = TaskState::Stopped;
                return Err(e);
            }
        };

        info!(
            "Pod in {} ready. Will backup every {} seconds",
            self.key, config.schedule_seconds
        );

        let labels = BackupLabels::new(&self.key, &container, &config);
        self.labels = Some(labels.clone());

        self.state = TaskState::Running;
        self.backup_loop(&config, &container, &labels).await;
        self.state = TaskState::Stopped;
        Ok(())
    }

    /// Read the backup settings and the target container from the Pod snapshot
    fn resolve(&self) -> Result<(BackupConfig, String)> {
        let config = BackupConfig::from_annotations(self.pod.annotations())?;
        let spec = self.pod.spec.as_ref().ok_or_else(|| {
            KabError::Configuration(format!("Pod {} has no spec", self.key))
        })?;
        let container = select_main_container(spec, config.container_name.as_deref())?;
        Ok((config, container.name.clone()))
    }

    async fn backup_loop(&self, config: &BackupConfig, container: &str, labels: &BackupLabels) {
        let command = config.backup.argv();

        while !self.cancel.is_cancelled() {
            let started = Instant::now();
            let result = self
                .pods
                .exec(&self.key.namespace, &self.key.name, container, &command)
                .await;

            match result {
                Ok(output) => {
                    self.metrics.record_success(labels, started.elapsed());
                    info!(
                        "Executed backup command in {} [{}] with return {:?}",
                        self.key, container, output.stdout
                    );
                }
                Err(e) => {
                    self.metrics.record_failure(labels);
                    warn!(
                        "Backup in {} [{}] failed, retrying in {} seconds: {}",
                        self.key, container, config.schedule_seconds, e
                    );
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(config.schedule()) => {}
            }
        }
    }
}
