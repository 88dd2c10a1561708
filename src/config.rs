// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::KabError;

/// NFS export that backs the injected backup volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfsTarget {
    pub server: String,
    pub root_path: String,
}

impl NfsTarget {
    /// Export path holding the data of one backup identity
    pub fn backup_path(&self, backup_name: &str) -> String {
        format!("{}/{}", self.root_path, backup_name)
    }
}

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// NFS coordinates, only required once a Pod is mutated
    pub nfs: Option<NfsTarget>,
    pub webhook_addr: SocketAddr,
    pub webhook_cert_file: PathBuf,
    pub webhook_key_file: PathBuf,
    pub metrics_addr: SocketAddr,
    /// Forces kubeconfig authentication, for running outside the cluster
    pub dev_mode: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let nfs = match (env::var("NFS_SERVER"), env::var("NFS_ROOT_PATH")) {
            (Ok(server), Ok(root_path)) => Some(NfsTarget { server, root_path }),
            _ => None,
        };

        let webhook_port: u16 = env::var("WEBHOOK_PORT")
            .or_else(|_| env::var("webhook_port"))
            .unwrap_or_else(|_| "8443".to_string())
            .parse()
            .context("WEBHOOK_PORT is not a valid port")?;

        let metrics_port: u16 = env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9090".to_string())
            .parse()
            .context("METRICS_PORT is not a valid port")?;

        Ok(Config {
            nfs,
            webhook_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, webhook_port)),
            webhook_cert_file: env::var("WEBHOOK_CERT_FILE")
                .unwrap_or_else(|_| "/etc/certs/tls.crt".to_string())
                .into(),
            webhook_key_file: env::var("WEBHOOK_KEY_FILE")
                .unwrap_or_else(|_| "/etc/certs/tls.key".to_string())
                .into(),
            metrics_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, metrics_port)),
            dev_mode: env::var_os("DEV").is_some(),
        })
    }
}

/// Resolve the NFS target, failing when the deployment did not provide it
pub fn require_nfs(nfs: Option<&NfsTarget>) -> crate::error::Result<&NfsTarget> {
    nfs.ok_or_else(|| {
        KabError::MissingEnvironment("NFS_SERVER and NFS_ROOT_PATH must both be set".to_string())
    })
}
