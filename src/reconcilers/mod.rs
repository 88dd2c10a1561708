// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes watchers that feed the operator's event source.

pub mod pod;

pub use pod::PodReconciler;
