// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns a Pod admission request into an admission response.

use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::ResourceExt;
use tracing::{debug, info, warn};

use crate::admission::mutator::mutate_pod;
use crate::backup::config::has_backup_schedule;
use crate::config::NfsTarget;
use crate::error::{KabError, Result};

/// Answer an admission request for a Pod.
///
/// Pods without the schedule annotation pass unchanged. Any failure to build the
/// patch denies the request, so no annotated Pod is admitted without its backup wiring.
pub fn review_pod(request: &AdmissionRequest<Pod>, nfs: Option<&NfsTarget>) -> AdmissionResponse {
    let uid = &request.uid;

    let Some(pod) = request.object.as_ref() else {
        debug!(uid = %uid, "No pod object in request, allowing unchanged");
        return AdmissionResponse::from(request);
    };

    if !has_backup_schedule(pod.metadata.annotations.as_ref()) {
        debug!(uid = %uid, "Pod has no backup schedule, allowing unchanged");
        return AdmissionResponse::from(request);
    }

    let pod_name = format!(
        "{}/{}",
        request.namespace.as_deref().unwrap_or_default(),
        pod.name_any()
    );

    let patch = match build_patch(pod, nfs) {
        Ok(Some(patch)) => patch,
        Ok(None) => {
            debug!(uid = %uid, pod = %pod_name, "Pod already carries its backup wiring");
            return AdmissionResponse::from(request);
        }
        Err(e) => {
            warn!(uid = %uid, pod = %pod_name, error = %e, "Denying pod");
            return AdmissionResponse::from(request).deny(e.to_string());
        }
    };

    info!(
        uid = %uid,
        pod = %pod_name,
        patch_ops = patch.0.len(),
        "Injecting backup volume and restorer"
    );

    match AdmissionResponse::from(request).with_patch(patch) {
        Ok(response) => response,
        Err(e) => {
            warn!(uid = %uid, pod = %pod_name, error = %e, "Failed to serialize patch");
            AdmissionResponse::from(request).deny(format!("patch serialization error: {e}"))
        }
    }
}

fn build_patch(pod: &Pod, nfs: Option<&NfsTarget>) -> Result<Option<json_patch::Patch>> {
    let spec = pod
        .spec
        .as_ref()
        .ok_or_else(|| KabError::Configuration("Pod has no spec".to_string()))?;

    let patch = mutate_pod(spec, pod.annotations(), nfs)?;
    if patch.is_empty() {
        return Ok(None);
    }
    patch.to_json_patch(spec).map(Some)
}
