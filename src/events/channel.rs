// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::error;

use super::{DaemonEvent, PendingAdmission, ResourceEventSource};
use crate::error::{KabError, Result};

const CHANNEL_CAPACITY: usize = 256;

/// Event source fed through channels by the webhook server and the Pod watcher
pub struct ChannelEventSource {
    admission_rx: Mutex<mpsc::Receiver<PendingAdmission>>,
    daemon_rx: Mutex<mpsc::Receiver<DaemonEvent>>,
}

/// Handle to push events into a [`ChannelEventSource`]
#[derive(Clone)]
pub struct EventSender {
    admission_tx: mpsc::Sender<PendingAdmission>,
    daemon_tx: mpsc::Sender<DaemonEvent>,
}

impl ChannelEventSource {
    pub fn new() -> (Self, EventSender) {
        let (admission_tx, admission_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (daemon_tx, daemon_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let source = Self {
            admission_rx: Mutex::new(admission_rx),
            daemon_rx: Mutex::new(daemon_rx),
        };
        let sender = EventSender {
            admission_tx,
            daemon_tx,
        };
        (source, sender)
    }
}

#[async_trait]
impl ResourceEventSource for ChannelEventSource {
    async fn next_admission_review(&self) -> Option<PendingAdmission> {
        self.admission_rx.lock().await.recv().await
    }

    async fn next_daemon_event(&self) -> Option<DaemonEvent> {
        self.daemon_rx.lock().await.recv().await
    }
}

impl EventSender {
    pub async fn send_daemon_event(&self, event: DaemonEvent) {
        if let Err(e) = self.daemon_tx.send(event).await {
            error!("Failed to send daemon event: {}", e);
        }
    }

    /// Queue an admission request and wait for its response
    pub async fn submit_admission(
        &self,
        request: AdmissionRequest<Pod>,
    ) -> Result<AdmissionResponse> {
        let (respond_to, response) = oneshot::channel();
        self.admission_tx
            .send(PendingAdmission {
                request,
                respond_to,
            })
            .await
            .map_err(|_| KabError::Server("Admission queue is closed".to_string()))?;

        response
            .await
            .map_err(|_| KabError::Server("Admission request was dropped".to_string()))
    }
}
