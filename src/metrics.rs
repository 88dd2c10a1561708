// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics for backup executions.

use std::time::Duration;

use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::backup::BackupConfig;
use crate::error::{KabError, Result};
use crate::events::PodKey;

const LABELS: [&str; 6] = [
    "friendly_name",
    "namespace",
    "pod",
    "container",
    "backup_name",
    "schedule",
];

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAILED: &str = "failed";

/// Label values identifying the backups of one Pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupLabels {
    pub friendly_name: String,
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub backup_name: String,
    pub schedule: String,
}

impl BackupLabels {
    pub fn new(key: &PodKey, container: &str, config: &BackupConfig) -> Self {
        Self {
            friendly_name: format!("{} ({})", key, config.backup_name),
            namespace: key.namespace.clone(),
            pod: key.name.clone(),
            container: container.to_string(),
            backup_name: config.backup_name.clone(),
            schedule: config.schedule_seconds.to_string(),
        }
    }

    fn values(&self) -> [&str; 6] {
        [
            &self.friendly_name,
            &self.namespace,
            &self.pod,
            &self.container,
            &self.backup_name,
            &self.schedule,
        ]
    }

    fn values_with_status<'a>(&'a self, status: &'a str) -> [&'a str; 7] {
        let [a, b, c, d, e, f] = self.values();
        [a, b, c, d, e, f, status]
    }
}

/// Recording sink for backup durations and outcomes
#[derive(Debug, Clone)]
pub struct BackupMetrics {
    duration_seconds: HistogramVec,
    executions_total: IntCounterVec,
    registry: Registry,
}

impl BackupMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "kab_backup_duration_seconds",
                "Duration of successful backup executions in seconds",
            )
            // 1s up to a bit over 2h
            .buckets(exponential_buckets(1.0, 2.0, 14)?),
            &LABELS,
        )?;

        let mut counter_labels = LABELS.to_vec();
        counter_labels.push("status");
        let executions_total = IntCounterVec::new(
            Opts::new(
                "kab_backup_executions_total",
                "Backup executions by outcome",
            ),
            &counter_labels,
        )?;

        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(executions_total.clone()))?;

        Ok(Self {
            duration_seconds,
            executions_total,
            registry,
        })
    }

    pub fn record_success(&self, labels: &BackupLabels, elapsed: Duration) {
        self.duration_seconds
            .with_label_values(&labels.values())
            .observe(elapsed.as_secs_f64());
        self.executions_total
            .with_label_values(&labels.values_with_status(STATUS_SUCCESS))
            .inc();
    }

    pub fn record_failure(&self, labels: &BackupLabels) {
        self.executions_total
            .with_label_values(&labels.values_with_status(STATUS_FAILED))
            .inc();
    }

    /// Drop every series of a Pod that is no longer backed up
    pub fn forget(&self, labels: &BackupLabels) {
        let _ = self.duration_seconds.remove_label_values(&labels.values());
        for status in [STATUS_SUCCESS, STATUS_FAILED] {
            let _ = self
                .executions_total
                .remove_label_values(&labels.values_with_status(status));
        }
    }

    /// Number of executions with the given outcome
    #[cfg(test)]
    pub(crate) fn executions(&self, labels: &BackupLabels, status: &str) -> u64 {
        self.executions_total
            .with_label_values(&labels.values_with_status(status))
            .get()
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| KabError::Server(format!("Metrics output is not UTF-8: {}", e)))
    }
}
