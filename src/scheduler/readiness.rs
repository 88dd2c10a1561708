// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Waiting for a Pod to become ready before backups start.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::constants::READY_POLL_INTERVAL_SECS;
use crate::events::PodKey;
use crate::kubernetes::PodOperations;

/// Result of waiting on a Pod's readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Cancelled,
}

/// Poll the Pod status until it is ready or `cancel` fires.
///
/// API errors count as "not ready yet"; this never fails.
pub async fn wait_for_ready(
    pods: &dyn PodOperations,
    key: &PodKey,
    cancel: &CancellationToken,
) -> Readiness {
    let interval = Duration::from_secs(READY_POLL_INTERVAL_SECS);

    loop {
        if cancel.is_cancelled() {
            return Readiness::Cancelled;
        }

        match pods.is_ready(&key.namespace, &key.name).await {
            Ok(true) => return Readiness::Ready,
            Ok(false) => info!("Pod in {} not ready yet...", key),
            Err(e) => warn!("API exception when reading pod status of {}: {}", key, e),
        }

        tokio::select! {
            _ = cancel.cancelled() => return Readiness::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
