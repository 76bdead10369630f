// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Version stamps carried as annotations.
//!
//! A managed secret records its current version under `<prefix>.<secret-name>`. Consuming
//! workloads mirror the last applied version under the same key, once on their own metadata
//! and once on their pod template. Only the pod template copy makes the controller roll the
//! pods; the workload copy marks the rollout as done.

use crate::constants::annotations::{AUTO_RELOAD, MANAGED_SECRET_PREFIX, VERSION};
use crate::kubernetes::Workload;
use crate::types::VersionStamp;
use k8s_openapi::api::core::v1::Secret;
use kube::{Resource, ResourceExt};

/// Annotation key holding the version stamp of `secret_name`
pub fn annotation_key(secret_name: &str) -> String {
    format!("{}.{}", MANAGED_SECRET_PREFIX, secret_name)
}

/// Current version of a managed secret, `None` if the secret is not managed
pub fn secret_version(secret: &Secret) -> Option<VersionStamp> {
    let annotations = secret.annotations();
    annotations
        .get(&annotation_key(&secret.name_any()))
        .or_else(|| annotations.get(VERSION))
        .map(|v| VersionStamp::new(v.as_str()))
}

/// Check if a workload has opted in to automatic rollouts
pub fn is_auto_reload_enabled<K: Resource>(resource: &K) -> bool {
    resource
        .annotations()
        .get(AUTO_RELOAD)
        .is_some_and(|v| v == "true")
}

/// Stamp on the workload's own metadata
pub fn workload_stamp<W: Workload>(workload: &W, key: &str) -> Option<VersionStamp> {
    workload
        .annotations()
        .get(key)
        .map(|v| VersionStamp::new(v.as_str()))
}

/// Stamp on the workload's pod template metadata
pub fn template_stamp<W: Workload>(workload: &W, key: &str) -> Option<VersionStamp> {
    workload
        .pod_template()
        .and_then(|t| t.metadata.as_ref())
        .and_then(|m| m.annotations.as_ref())
        .and_then(|a| a.get(key))
        .map(|v| VersionStamp::new(v.as_str()))
}

/// Write `stamp` to both the workload metadata and the pod template metadata
pub fn write_stamp<W: Workload>(workload: &mut W, key: &str, stamp: &VersionStamp) {
    workload
        .annotations_mut()
        .insert(key.to_string(), stamp.to_string());

    workload
        .pod_template_mut()
        .metadata
        .get_or_insert_with(Default::default)
        .annotations
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), stamp.to_string());
}
