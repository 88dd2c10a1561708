// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Events delivered by the operator runtime: admission reviews and daemon lifecycle changes.

pub mod channel;

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::ResourceExt;
use tokio::sync::oneshot;

pub use channel::{ChannelEventSource, EventSender};

/// Identity of a backed-up Pod
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PodKey {
    pub namespace: String,
    pub name: String,
}

impl PodKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn from_pod(pod: &Pod) -> Self {
        Self::new(pod.namespace().unwrap_or_default(), pod.name_any())
    }
}

impl fmt::Display for PodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Lifecycle changes of backup daemons
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    /// A Pod carrying the schedule annotation was seen or updated
    Observed { pod: Box<Pod> },
    /// The Pod was deleted, is terminating, or lost its schedule annotation
    Gone { key: PodKey },
    /// A full relist finished, `live` holds every annotated Pod that still exists
    Resync { live: HashSet<PodKey> },
}

/// An admission request waiting for its response
#[derive(Debug)]
pub struct PendingAdmission {
    pub request: AdmissionRequest<Pod>,
    pub respond_to: oneshot::Sender<AdmissionResponse>,
}

/// Source of the events that drive the mutator and the backup daemons
#[async_trait]
pub trait ResourceEventSource: Send + Sync {
    /// Next admission review, `None` once no more reviews can arrive
    async fn next_admission_review(&self) -> Option<PendingAdmission>;

    /// Next daemon lifecycle event, `None` once the source is closed
    async fn next_daemon_event(&self) -> Option<DaemonEvent>;
}
