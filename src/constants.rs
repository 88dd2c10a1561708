// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys read from backed-up Pods
pub mod annotations {
    /// Seconds between backups. Its presence activates both the daemon and the mutation
    pub const BACKUP_SCHEDULE: &str = "kab.boa.nu/backup-schedule";
    /// Logical backup identity, also used as the NFS subpath
    pub const BACKUP_NAME: &str = "kab.boa.nu/backup-name";
    /// Target container when the Pod has more than one
    pub const CONTAINER_NAME: &str = "kab.boa.nu/container-name";
    pub const BACKUP_EXEC: &str = "kab.boa.nu/backup-exec";
    pub const BACKUP_EXEC_SHELL: &str = "kab.boa.nu/backup-exec-shell";
    pub const RESTORE_EXEC: &str = "kab.boa.nu/restore-exec";
    pub const RESTORE_EXEC_SHELL: &str = "kab.boa.nu/restore-exec-shell";
}

/// Names and paths of the elements injected into Pods
pub mod injection {
    pub const BACKUP_VOLUME_NAME: &str = "backup-volume";
    pub const RESTORER_NAME: &str = "kab-restorer";
    pub const BACKUP_MOUNT_PATH: &str = "/kab-backup";
}

pub const DEFAULT_BACKUP_NAME: &str = "default";
pub const DEFAULT_SHELL: [&str; 2] = ["/bin/sh", "-c"];

/// Interval between Pod readiness checks
pub const READY_POLL_INTERVAL_SECS: u64 = 5;

/// Backoff before a daemon that hit a configuration error is restarted
pub const CONFIG_RETRY_DELAY_SECS: u64 = 60;

pub const SERVICE_ACCOUNT_TOKEN_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
