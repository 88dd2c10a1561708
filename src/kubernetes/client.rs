// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation

use std::path::Path;

use crate::config::Config;
use crate::constants::SERVICE_ACCOUNT_TOKEN_FILE;
use crate::error::{KabError, Result};
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::info;

/// Create the API client, preferring the mounted service-account token
pub async fn create_client(config: &Config) -> Result<Client> {
    let token_present = Path::new(SERVICE_ACCOUNT_TOKEN_FILE).is_file();

    let client_config = if use_service_account(config.dev_mode, token_present) {
        info!(
            "Found serviceaccount token file at {}. Login via service-account",
            SERVICE_ACCOUNT_TOKEN_FILE
        );
        KConfig::incluster().map_err(|e| {
            KabError::KubeconfigError(format!("Failed to load in-cluster config: {}", e))
        })?
    } else {
        info!("Login via kubeconfig, no token-file found or DEV mode enabled");
        KConfig::from_kubeconfig(&KubeConfigOptions::default())
            .await
            .map_err(|e| KabError::KubeconfigError(format!("Failed to load kubeconfig: {}", e)))?
    };

    Client::try_from(client_config)
        .map_err(|e| KabError::KubeconfigError(format!("Failed to create client: {}", e)))
}

fn use_service_account(dev_mode: bool, token_present: bool) -> bool {
    !dev_mode && token_present
}
