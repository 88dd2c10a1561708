// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::{Container, PodSpec};

use crate::error::{KabError, Result};

/// Resolve the container that backups run in.
///
/// A Pod with a single container always resolves to it, whatever name was asked for.
/// Otherwise the first container with a matching name wins.
pub fn select_main_container<'a>(spec: &'a PodSpec, name: Option<&str>) -> Result<&'a Container> {
    select_main_container_index(spec, name).map(|index| &spec.containers[index])
}

/// Same as [`select_main_container`], returning the container's position in the spec
pub fn select_main_container_index(spec: &PodSpec, name: Option<&str>) -> Result<usize> {
    if spec.containers.len() == 1 {
        return Ok(0);
    }

    name.and_then(|name| spec.containers.iter().position(|c| c.name == name))
        .ok_or_else(|| {
            KabError::Configuration(format!(
                "No container named {} found.",
                name.unwrap_or("<unset>")
            ))
        })
}
