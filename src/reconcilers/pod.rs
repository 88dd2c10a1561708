// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod watcher - turns Pod watch events into backup daemon lifecycle events.

use std::collections::HashSet;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{runtime::WatchStreamExt, Api, Client};
use kube_runtime::watcher::{watcher, Config as WatcherConfig, Event};
use tracing::{debug, info, warn};

use crate::backup::config::has_backup_schedule;
use crate::events::{DaemonEvent, EventSender, PodKey};

pub struct PodReconciler {
    client: Client,
    events: EventSender,
}

impl PodReconciler {
    pub fn new(client: Client, events: EventSender) -> Self {
        Self { client, events }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let mut stream = watcher(pods, WatcherConfig::default())
            .default_backoff()
            .boxed();
        let mut relist = None;

        info!("Watching pods for backup annotations");

        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    for daemon_event in translate(event, &mut relist) {
                        self.events.send_daemon_event(daemon_event).await;
                    }
                }
                Err(e) => warn!("Pod watch error: {}", e),
            }
        }

        warn!("Pod watch stream ended");
        Ok(())
    }
}

/// Whether the Pod should have a running backup daemon
fn wants_daemon(pod: &Pod) -> bool {
    has_backup_schedule(pod.metadata.annotations.as_ref())
        && pod.metadata.deletion_timestamp.is_none()
}

fn observed_or_gone(pod: Pod) -> DaemonEvent {
    if wants_daemon(&pod) {
        DaemonEvent::Observed { pod: Box::new(pod) }
    } else {
        DaemonEvent::Gone {
            key: PodKey::from_pod(&pod),
        }
    }
}

/// Map one watch event to daemon events.
///
/// `relist` collects the annotated Pods seen between `Init` and `InitDone`.
fn translate(event: Event<Pod>, relist: &mut Option<HashSet<PodKey>>) -> Vec<DaemonEvent> {
    match event {
        Event::Apply(pod) => vec![observed_or_gone(pod)],
        Event::Delete(pod) => vec![DaemonEvent::Gone {
            key: PodKey::from_pod(&pod),
        }],
        Event::Init => {
            debug!("Pod relist started");
            *relist = Some(HashSet::new());
            Vec::new()
        }
        Event::InitApply(pod) => {
            if let Some(live) = relist.as_mut().filter(|_| wants_daemon(&pod)) {
                live.insert(PodKey::from_pod(&pod));
            }
            vec![observed_or_gone(pod)]
        }
        Event::InitDone => {
            debug!("Pod relist finished");
            relist
                .take()
                .map(|live| vec![DaemonEvent::Resync { live }])
                .unwrap_or_default()
        }
    }
}
