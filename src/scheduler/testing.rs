// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory [`PodOperations`] for scheduler tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use kube::api::ObjectMeta;

use crate::constants::annotations;
use crate::error::{KabError, Result};
use crate::kubernetes::{ExecOutput, PodOperations};

/// A recorded exec call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub namespace: String,
    pub name: String,
    pub container: String,
    pub command: Vec<String>,
}

pub struct FakePods {
    ready_after: usize,
    status_errors: usize,
    exec_fails: bool,
    exec_duration: Duration,
    status_queries: AtomicUsize,
    exec_calls: Mutex<Vec<ExecCall>>,
}

impl FakePods {
    /// Reports not ready for the first `polls` queries, ready afterwards
    pub fn ready_after(polls: usize) -> Self {
        Self {
            ready_after: polls,
            status_errors: 0,
            exec_fails: false,
            exec_duration: Duration::ZERO,
            status_queries: AtomicUsize::new(0),
            exec_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn never_ready() -> Self {
        Self::ready_after(usize::MAX)
    }

    /// The first `count` status queries fail
    pub fn with_status_errors(mut self, count: usize) -> Self {
        self.status_errors = count;
        self
    }

    pub fn with_failing_exec(mut self) -> Self {
        self.exec_fails = true;
        self
    }

    pub fn with_exec_duration(mut self, duration: Duration) -> Self {
        self.exec_duration = duration;
        self
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    pub fn exec_calls(&self) -> Vec<ExecCall> {
        self.exec_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PodOperations for FakePods {
    async fn is_ready(&self, _namespace: &str, _name: &str) -> Result<bool> {
        let query = self.status_queries.fetch_add(1, Ordering::SeqCst);
        if query < self.status_errors {
            return Err(KabError::Execution("status unavailable".to_string()));
        }
        Ok(query >= self.ready_after)
    }

    async fn exec(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput> {
        self.exec_calls.lock().unwrap().push(ExecCall {
            namespace: namespace.to_string(),
            name: name.to_string(),
            container: container.to_string(),
            command: command.to_vec(),
        });

        if !self.exec_duration.is_zero() {
            tokio::time::sleep(self.exec_duration).await;
        }

        if self.exec_fails {
            return Err(KabError::Execution("container not found".to_string()));
        }
        Ok(ExecOutput::default())
    }
}

/// A single-container Pod with the given annotations
pub fn make_pod(namespace: &str, name: &str, pairs: &[(&str, &str)]) -> Pod {
    let annotations: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "app".to_string(),
                image: Some("busybox".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A Pod that backs up every `schedule` seconds with `echo backup`
pub fn make_backup_pod(namespace: &str, name: &str, schedule: &str) -> Pod {
    make_pod(
        namespace,
        name,
        &[
            (annotations::BACKUP_SCHEDULE, schedule),
            (annotations::BACKUP_EXEC, "echo backup"),
        ],
    )
}
