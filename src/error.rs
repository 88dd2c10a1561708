// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use crate::constants::CONFIG_RETRY_DELAY_SECS;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KabError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Kubernetes client setup failed: {0}")]
    KubeconfigError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backup execution failed: {0}")]
    Execution(String),

    #[error("Missing environment configuration: {0}")]
    MissingEnvironment(String),

    #[error("Failed to build admission patch: {0}")]
    Patch(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl KabError {
    /// Whether the failure should be retried later instead of being treated as final
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KabError::KubeError(_) | KabError::Configuration(_) | KabError::Execution(_)
        )
    }

    /// Delay before a daemon that failed with this error is started again
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(CONFIG_RETRY_DELAY_SECS)
    }
}

pub type Result<T> = std::result::Result<T, KabError>;
