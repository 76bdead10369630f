// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Brings a single workload in line with the current version of a secret

use crate::error::{Result, RolloutError};
use crate::kubernetes::{ControlPlane, Workload};
use crate::rollout::annotations::{
    annotation_key, secret_version, template_stamp, workload_stamp, write_stamp,
};
use crate::types::ManagedSecretRef;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::{debug, info, instrument};

/// Stamp `workload` with the version of `secret` and persist it, unless both stamps are
/// already current.
///
/// Returns whether an update was written. The update is a single optimistic replace; a
/// conflict is returned as an error and left for the next pass.
#[instrument(skip(control_plane, workload, secret), fields(workload = %workload.describe()))]
pub async fn reconcile_workload<C, W>(control_plane: &C, mut workload: W, secret: &Secret) -> Result<bool>
where
    C: ControlPlane,
    W: Workload,
{
    let key = annotation_key(&secret.name_any());
    let stamp = secret_version(secret).ok_or_else(|| {
        RolloutError::MissingVersion(ManagedSecretRef::from_secret(secret).to_string())
    })?;

    let current = workload_stamp(&workload, &key);
    let template = template_stamp(&workload, &key);
    if current.as_ref() == Some(&stamp) && template.as_ref() == Some(&stamp) {
        debug!("Already running secret version {}, no action required", stamp);
        return Ok(false);
    }

    info!(
        "Secret version changed ({} -> {}), restarting {}",
        current.as_ref().map(|s| s.as_str()).unwrap_or("<none>"),
        stamp,
        workload.describe()
    );

    write_stamp(&mut workload, &key, &stamp);
    control_plane.update_workload(&workload).await?;

    Ok(true)
}
