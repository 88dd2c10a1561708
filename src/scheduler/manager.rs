// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keeps exactly one backup daemon running per annotated Pod.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use k8s_openapi::api::core::v1::Pod;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::{DaemonEvent, PodKey};
use crate::kubernetes::PodOperations;
use crate::metrics::BackupMetrics;
use crate::scheduler::task::PodTask;

struct RunningDaemon {
    /// UID of the Pod the daemon was started for
    uid: Option<String>,
    cancel: CancellationToken,
    /// Latest Pod snapshot, picked up when the daemon restarts after an error
    snapshot: watch::Sender<Pod>,
    handle: JoinHandle<()>,
}

/// Starts and stops backup daemons in response to [`DaemonEvent`]s
pub struct DaemonManager {
    pods: Arc<dyn PodOperations>,
    metrics: BackupMetrics,
    daemons: HashMap<PodKey, RunningDaemon>,
}

impl DaemonManager {
    pub fn new(pods: Arc<dyn PodOperations>, metrics: BackupMetrics) -> Self {
        Self {
            pods,
            metrics,
            daemons: HashMap::new(),
        }
    }

    pub fn handle_event(&mut self, event: DaemonEvent) {
        match event {
            DaemonEvent::Observed { pod } => self.observe(*pod),
            DaemonEvent::Gone { key } => self.stop(&key),
            DaemonEvent::Resync { live } => self.resync(&live),
        }
    }

    pub fn is_running(&self, key: &PodKey) -> bool {
        self.daemons.contains_key(key)
    }

    pub fn running(&self) -> usize {
        self.daemons.len()
    }

    fn observe(&mut self, pod: Pod) {
        let key = PodKey::from_pod(&pod);
        let uid = pod.metadata.uid.clone();

        if let Some(daemon) = self.daemons.get(&key) {
            if daemon.uid != uid {
                info!("Pod {} was recreated, replacing its backup daemon", key);
                self.stop(&key);
            } else if !daemon.handle.is_finished() {
                debug!("Backup daemon for {} already running", key);
                daemon.snapshot.send_replace(pod);
                return;
            } else {
                warn!("Backup daemon for {} exited unexpectedly, restarting", key);
            }
        }

        info!("Starting backup daemon for {}", key);
        let cancel = CancellationToken::new();
        let (snapshot, snapshot_rx) = watch::channel(pod);
        let handle = tokio::spawn(supervise(
            snapshot_rx,
            self.pods.clone(),
            self.metrics.clone(),
            cancel.clone(),
        ));

        self.daemons.insert(
            key,
            RunningDaemon {
                uid,
                cancel,
                snapshot,
                handle,
            },
        );
    }

    fn stop(&mut self, key: &PodKey) {
        if let Some(daemon) = self.daemons.remove(key) {
            info!("Stopping backup daemon for {}", key);
            daemon.cancel.cancel();
        }
    }

    fn resync(&mut self, live: &HashSet<PodKey>) {
        let stale: Vec<PodKey> = self
            .daemons
            .keys()
            .filter(|key| !live.contains(*key))
            .cloned()
            .collect();

        for key in stale {
            self.stop(&key);
        }
    }

    /// Cancel every daemon and wait for them to finish
    pub async fn shutdown(&mut self) {
        info!("Stopping {} backup daemons", self.daemons.len());
        for daemon in self.daemons.values() {
            daemon.cancel.cancel();
        }
        for (key, daemon) in self.daemons.drain() {
            if let Err(e) = daemon.handle.await {
                warn!("Backup daemon for {} did not stop cleanly: {}", key, e);
            }
        }
    }
}

/// Run a Pod's task, restarting it after its retry delay whenever it fails.
///
/// Once the task is cancelled its metric series are dropped.
async fn supervise(
    mut snapshot: watch::Receiver<Pod>,
    pods: Arc<dyn PodOperations>,
    metrics: BackupMetrics,
    cancel: CancellationToken,
) {
    loop {
        let pod = snapshot.borrow_and_update().clone();
        let key = PodKey::from_pod(&pod);
        let mut task = PodTask::new(pod, pods.clone(), metrics.clone(), cancel.clone());

        let e = match task.run().await {
            Ok(()) => {
                if let Some(labels) = task.labels() {
                    metrics.forget(labels);
                }
                return;
            }
            Err(e) => e,
        };

        if !e.is_retryable() {
            error!("Backup daemon for {} stopped: {}", key, e);
            return;
        }

        let delay = e.retry_delay();
        warn!(
            "Backup daemon for {} failed, retrying in {} seconds: {}",
            key,
            delay.as_secs(),
            e
        );

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::annotations;
    use crate::scheduler::testing::{make_backup_pod, make_pod, FakePods};
    use std::time::Duration;

    fn make_manager(pods: Arc<FakePods>) -> DaemonManager {
        DaemonManager::new(pods, BackupMetrics::new().unwrap())
    }

    fn with_uid(mut pod: Pod, uid: &str) -> Pod {
        pod.metadata.uid = Some(uid.to_string());
        pod
    }

    fn observed(pod: Pod) -> DaemonEvent {
        DaemonEvent::Observed { pod: Box::new(pod) }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_daemon_per_pod() {
        let pods = Arc::new(FakePods::ready_after(0));
        let mut manager = make_manager(pods.clone());

        manager.handle_event(observed(make_backup_pod("ns", "db-0", "60")));
        manager.handle_event(observed(make_backup_pod("ns", "db-0", "60")));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(manager.running(), 1);
        assert_eq!(pods.exec_calls().len(), 1);

        manager.shutdown().await;
        assert_eq!(manager.running(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gone_stops_daemon() {
        let pods = Arc::new(FakePods::ready_after(0));
        let mut manager = make_manager(pods.clone());
        let key = PodKey::new("ns", "db-0");

        manager.handle_event(observed(make_backup_pod("ns", "db-0", "10")));
        tokio::time::sleep(Duration::from_secs(1)).await;
        manager.handle_event(DaemonEvent::Gone { key: key.clone() });
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(!manager.is_running(&key));
        assert_eq!(pods.exec_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_stops_stale_daemons() {
        let pods = Arc::new(FakePods::never_ready());
        let mut manager = make_manager(pods.clone());

        manager.handle_event(observed(make_backup_pod("ns", "a", "60")));
        manager.handle_event(observed(make_backup_pod("ns", "b", "60")));
        manager.handle_event(DaemonEvent::Resync {
            live: HashSet::from([PodKey::new("ns", "b")]),
        });

        assert!(!manager.is_running(&PodKey::new("ns", "a")));
        assert!(manager.is_running(&PodKey::new("ns", "b")));
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_configuration_error_retries_with_latest_snapshot() {
        let pods = Arc::new(FakePods::ready_after(0));
        let mut manager = make_manager(pods.clone());

        let broken = make_pod("ns", "db-0", &[(annotations::BACKUP_SCHEDULE, "60")]);
        manager.handle_event(observed(broken));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(pods.exec_calls().is_empty());

        manager.handle_event(observed(make_backup_pod("ns", "db-0", "60")));
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(pods.exec_calls().len(), 1);
        assert_eq!(pods.exec_calls()[0].command, vec!["/bin/sh", "-c", "echo backup"]);
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_daemon_keeps_resolved_settings() {
        let pods = Arc::new(FakePods::ready_after(0));
        let mut manager = make_manager(pods.clone());

        manager.handle_event(observed(make_backup_pod("ns", "db-0", "60")));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(pods.exec_calls().len(), 1);

        let changed = make_pod(
            "ns",
            "db-0",
            &[
                (annotations::BACKUP_SCHEDULE, "10"),
                (annotations::BACKUP_EXEC, "echo changed"),
            ],
        );
        manager.handle_event(observed(changed));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(pods.exec_calls().len(), 1);

        tokio::time::sleep(Duration::from_secs(40)).await;
        let calls = pods.exec_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].command, vec!["/bin/sh", "-c", "echo backup"]);
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_recreated_pod_restarts_daemon() {
        let pods = Arc::new(FakePods::ready_after(0));
        let mut manager = make_manager(pods.clone());

        manager.handle_event(observed(with_uid(make_backup_pod("ns", "db-0", "60"), "uid-1")));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let recreated = make_pod(
            "ns",
            "db-0",
            &[
                (annotations::BACKUP_SCHEDULE, "60"),
                (annotations::BACKUP_EXEC, "echo recreated"),
            ],
        );
        manager.handle_event(observed(with_uid(recreated, "uid-2")));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let calls = pods.exec_calls();
        assert_eq!(manager.running(), 1);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].command, vec!["/bin/sh", "-c", "echo recreated"]);
        manager.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_daemons_drop_their_metrics() {
        let pods = Arc::new(FakePods::ready_after(0));
        let metrics = BackupMetrics::new().unwrap();
        let mut manager = DaemonManager::new(pods.clone(), metrics.clone());

        for i in 0..20 {
            manager.handle_event(observed(make_backup_pod("ns", &format!("web-{i}"), "60")));
        }
        manager.handle_event(observed(make_backup_pod("ns", "db-0", "60")));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(metrics.render().unwrap().contains("pod=\"web-7\""));

        for i in 0..20 {
            manager.handle_event(DaemonEvent::Gone {
                key: PodKey::new("ns", &format!("web-{i}")),
            });
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        let text = metrics.render().unwrap();
        assert_eq!(manager.running(), 1);
        assert!(!text.contains("pod=\"web-"));
        assert!(text.contains("pod=\"db-0\""));
        manager.shutdown().await;
    }
}
