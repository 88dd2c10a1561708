// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Backup daemons: readiness gating, the scheduled backup loop and their supervision.

pub mod manager;
pub mod readiness;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use manager::DaemonManager;
pub use readiness::{wait_for_ready, Readiness};
pub use task::{PodTask, TaskState};
