// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Admission-time mutation of Pods that opted in to backups.

pub mod mutator;
pub mod review;

pub use mutator::{mutate_pod, MountAddition, PodSpecPatch};
pub use review::review_pod;
