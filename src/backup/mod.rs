// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Backup settings parsed from Pod annotations, container selection and command building.

pub mod command;
pub mod config;
pub mod container;

pub use command::build_exec_command;
pub use config::{BackupConfig, ExecSpec};
pub use container::select_main_container;
