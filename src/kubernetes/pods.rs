// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod status and exec access

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{api::AttachParams, Api, Client};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument};

use crate::error::{KabError, Result};

/// Captured output of a command run inside a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Access to the Pods that are backed up
#[async_trait]
pub trait PodOperations: Send + Sync {
    /// Whether the Pod reports a `Ready=True` condition
    async fn is_ready(&self, namespace: &str, name: &str) -> Result<bool>;

    /// Run `command` inside `container` and wait for it to finish
    async fn exec(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput>;
}

/// [`PodOperations`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubePodClient {
    client: Client,
}

impl KubePodClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodOperations for KubePodClient {
    #[instrument(skip(self))]
    async fn is_ready(&self, namespace: &str, name: &str) -> Result<bool> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get_status(name).await?;
        Ok(is_pod_ready(&pod))
    }

    #[instrument(skip(self, command))]
    async fn exec(
        &self,
        namespace: &str,
        name: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(true)
            .stderr(true)
            .tty(false);

        let mut attached = pods.exec(name, command.to_vec(), &params).await?;
        let status = attached.take_status();

        let (stdout, stderr) = tokio::join!(
            read_stream(attached.stdout()),
            read_stream(attached.stderr())
        );
        let output = ExecOutput {
            stdout: stdout?,
            stderr: stderr?,
        };

        let status = match status {
            Some(status) => status.await,
            None => None,
        };
        attached
            .join()
            .await
            .map_err(|e| KabError::Execution(format!("Exec stream failed: {}", e)))?;

        match status {
            Some(s) if s.status.as_deref() != Some("Success") => Err(KabError::Execution(
                s.message
                    .unwrap_or_else(|| "command exited unsuccessfully".to_string()),
            )),
            _ => {
                debug!(stdout = %output.stdout, stderr = %output.stderr, "Exec finished");
                Ok(output)
            }
        }
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> Result<String> {
    let mut buffer = String::new();
    if let Some(mut stream) = stream {
        stream
            .read_to_string(&mut buffer)
            .await
            .map_err(|e| KabError::Execution(format!("Failed to read exec output: {}", e)))?;
    }
    Ok(buffer)
}

/// Check the Pod's status conditions for `Ready=True`
pub fn is_pod_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}
