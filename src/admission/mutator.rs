// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Computes the additions that wire a Pod up for backups.
//!
//! The mutator never touches its input. It returns a [`PodSpecPatch`] holding only the
//! elements that are missing, matched by their fixed names, so running it on an already
//! mutated spec yields an empty patch.

use std::collections::BTreeMap;

use json_patch::{AddOperation, Patch, PatchOperation};
use jsonptr::PointerBuf;
use k8s_openapi::api::core::v1::{Container, NFSVolumeSource, PodSpec, Volume, VolumeMount};
use serde::Serialize;

use crate::backup::config::{backup_name, container_name, restore_exec};
use crate::backup::container::select_main_container_index;
use crate::config::{require_nfs, NfsTarget};
use crate::constants::injection::{BACKUP_MOUNT_PATH, BACKUP_VOLUME_NAME, RESTORER_NAME};
use crate::error::{KabError, Result};

/// Volume mounts appended to one container
#[derive(Debug, Clone, PartialEq)]
pub struct MountAddition {
    pub container_index: usize,
    pub volume_mounts: Vec<VolumeMount>,
}

/// Additive changes to a Pod spec
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodSpecPatch {
    pub volumes: Vec<Volume>,
    pub volume_mounts: Option<MountAddition>,
    pub init_containers: Vec<Container>,
}

/// Compute the backup volume, mount and restorer init container missing from `spec`
pub fn mutate_pod(
    spec: &PodSpec,
    annotations: &BTreeMap<String, String>,
    nfs: Option<&NfsTarget>,
) -> Result<PodSpecPatch> {
    let mut patch = PodSpecPatch::default();

    if !has_named(spec.volumes.as_deref(), |v| &v.name, BACKUP_VOLUME_NAME) {
        let nfs = require_nfs(nfs)?;
        patch.volumes.push(Volume {
            name: BACKUP_VOLUME_NAME.to_string(),
            nfs: Some(NFSVolumeSource {
                server: nfs.server.clone(),
                path: nfs.backup_path(backup_name(annotations)),
                read_only: None,
            }),
            ..Default::default()
        });
    }

    let index = select_main_container_index(spec, container_name(annotations))?;
    let mut main = spec.containers[index].clone();

    if !has_named(main.volume_mounts.as_deref(), |m| &m.name, BACKUP_VOLUME_NAME) {
        let mount = VolumeMount {
            name: BACKUP_VOLUME_NAME.to_string(),
            mount_path: BACKUP_MOUNT_PATH.to_string(),
            read_only: Some(false),
            ..Default::default()
        };
        main.volume_mounts.get_or_insert_with(Vec::new).push(mount.clone());
        patch.volume_mounts = Some(MountAddition {
            container_index: index,
            volume_mounts: vec![mount],
        });
    }

    if !has_named(spec.init_containers.as_deref(), |c| &c.name, RESTORER_NAME) {
        let restore = restore_exec(annotations)?;
        patch.init_containers.push(Container {
            name: RESTORER_NAME.to_string(),
            command: Some(restore.argv()),
            ..main
        });
    }

    Ok(patch)
}

fn has_named<T>(items: Option<&[T]>, name_of: impl Fn(&T) -> &String, name: &str) -> bool {
    items.is_some_and(|items| items.iter().any(|item| name_of(item) == name))
}

impl PodSpecPatch {
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty() && self.volume_mounts.is_none() && self.init_containers.is_empty()
    }

    /// The spec with this patch applied
    pub fn applied_to(&self, spec: &PodSpec) -> PodSpec {
        let mut patched = spec.clone();

        if !self.volumes.is_empty() {
            patched
                .volumes
                .get_or_insert_with(Vec::new)
                .extend(self.volumes.iter().cloned());
        }
        if let Some(addition) = &self.volume_mounts {
            patched.containers[addition.container_index]
                .volume_mounts
                .get_or_insert_with(Vec::new)
                .extend(addition.volume_mounts.iter().cloned());
        }
        if !self.init_containers.is_empty() {
            patched
                .init_containers
                .get_or_insert_with(Vec::new)
                .extend(self.init_containers.iter().cloned());
        }

        patched
    }

    /// Express the patch as RFC 6902 operations against the Pod the spec belongs to
    pub fn to_json_patch(&self, spec: &PodSpec) -> Result<Patch> {
        let mut ops = Vec::new();

        append_ops(&mut ops, &["spec", "volumes"], spec.volumes.is_some(), &self.volumes)?;

        if let Some(addition) = &self.volume_mounts {
            let index = addition.container_index.to_string();
            let exists = spec.containers[addition.container_index]
                .volume_mounts
                .is_some();
            append_ops(
                &mut ops,
                &["spec", "containers", index.as_str(), "volumeMounts"],
                exists,
                &addition.volume_mounts,
            )?;
        }

        append_ops(
            &mut ops,
            &["spec", "initContainers"],
            spec.init_containers.is_some(),
            &self.init_containers,
        )?;

        Ok(Patch(ops))
    }
}

/// Append `items` to the array at `path`, creating the array when it does not exist yet
fn append_ops<T: Serialize>(
    ops: &mut Vec<PatchOperation>,
    path: &[&str],
    exists: bool,
    items: &[T],
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }

    if !exists {
        ops.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(path.iter().copied()),
            value: to_value(items)?,
        }));
        return Ok(());
    }

    for item in items {
        ops.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(path.iter().copied().chain(["-"])),
            value: to_value(item)?,
        }));
    }
    Ok(())
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| KabError::Patch(e.to_string()))
}
