// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation and Pod access.

pub mod client;
pub mod pods;

pub use client::create_client;
pub use pods::{is_pod_ready, ExecOutput, KubePodClient, PodOperations};
