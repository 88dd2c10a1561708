// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed backup settings, parsed once from a Pod's annotations.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::backup::command::build_exec_command;
use crate::constants::{annotations, DEFAULT_BACKUP_NAME};
use crate::error::{KabError, Result};

/// A command together with the shell it is run through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSpec {
    pub shell: Option<String>,
    pub command: String,
}

impl ExecSpec {
    /// Read a command annotation and its optional shell annotation
    fn from_annotations(
        annotations: &BTreeMap<String, String>,
        command_key: &str,
        shell_key: &str,
    ) -> Result<Self> {
        let command = annotations
            .get(command_key)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                KabError::Configuration(format!("No command specified in {}", command_key))
            })?;

        Ok(ExecSpec {
            shell: annotations.get(shell_key).cloned(),
            command: command.to_string(),
        })
    }

    pub fn argv(&self) -> Vec<String> {
        build_exec_command(self.shell.as_deref(), &self.command)
    }
}

/// Backup settings of one Pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    pub container_name: Option<String>,
    pub backup_name: String,
    pub schedule_seconds: u64,
    pub backup: ExecSpec,
    /// Only needed when the restorer init container is injected
    pub restore: Option<ExecSpec>,
}

impl BackupConfig {
    /// Parse and validate the settings the backup daemon needs
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Result<Self> {
        let schedule_seconds = parse_schedule(annotations)?;
        let backup = ExecSpec::from_annotations(
            annotations,
            annotations::BACKUP_EXEC,
            annotations::BACKUP_EXEC_SHELL,
        )?;

        Ok(BackupConfig {
            container_name: container_name(annotations).map(str::to_string),
            backup_name: backup_name(annotations).to_string(),
            schedule_seconds,
            backup,
            restore: restore_exec(annotations).ok(),
        })
    }

    pub fn schedule(&self) -> Duration {
        Duration::from_secs(self.schedule_seconds)
    }
}

fn parse_schedule(annotations: &BTreeMap<String, String>) -> Result<u64> {
    let raw = annotations.get(annotations::BACKUP_SCHEDULE).ok_or_else(|| {
        KabError::Configuration(format!("Missing {} annotation", annotations::BACKUP_SCHEDULE))
    })?;

    match raw.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(seconds),
        _ => Err(KabError::Configuration(format!(
            "Invalid {} '{}': expected a positive number of seconds",
            annotations::BACKUP_SCHEDULE,
            raw
        ))),
    }
}

/// Whether the Pod opted in to backups
pub fn has_backup_schedule(annotations: Option<&BTreeMap<String, String>>) -> bool {
    annotations.is_some_and(|a| a.contains_key(annotations::BACKUP_SCHEDULE))
}

/// Logical backup identity, `default` when not annotated
pub fn backup_name(annotations: &BTreeMap<String, String>) -> &str {
    annotations
        .get(annotations::BACKUP_NAME)
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_BACKUP_NAME)
}

pub fn container_name(annotations: &BTreeMap<String, String>) -> Option<&str> {
    annotations
        .get(annotations::CONTAINER_NAME)
        .map(|s| s.as_str())
}

/// The restore command run by the injected init container
pub fn restore_exec(annotations: &BTreeMap<String, String>) -> Result<ExecSpec> {
    ExecSpec::from_annotations(
        annotations,
        annotations::RESTORE_EXEC,
        annotations::RESTORE_EXEC_SHELL,
    )
}
