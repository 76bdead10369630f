// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decides whether a workload consumes a secret at runtime.
//!
//! Only references that are resolved when a container starts count: env vars sourced from a
//! secret key, `envFrom` secret references and secret-backed volumes (plain or projected).
//! Image pull secrets are never a match, pods don't need a restart to pick those up.

use crate::kubernetes::Workload;
use k8s_openapi::api::core::v1::{Container, PodSpec, Volume};

/// Check if any container, init container or volume of the workload references `secret_name`
pub fn uses_secret<W: Workload>(workload: &W, secret_name: &str) -> bool {
    workload
        .pod_template()
        .and_then(|t| t.spec.as_ref())
        .is_some_and(|spec| pod_spec_uses_secret(spec, secret_name))
}

pub fn pod_spec_uses_secret(spec: &PodSpec, secret_name: &str) -> bool {
    let mut containers = spec
        .containers
        .iter()
        .chain(spec.init_containers.iter().flatten());

    containers.any(|c| container_uses_secret(c, secret_name))
        || spec
            .volumes
            .iter()
            .flatten()
            .any(|v| volume_uses_secret(v, secret_name))
}

fn container_uses_secret(container: &Container, secret_name: &str) -> bool {
    let from_env_from = container
        .env_from
        .iter()
        .flatten()
        .filter_map(|source| source.secret_ref.as_ref())
        .any(|secret_ref| secret_ref.name == secret_name);

    let from_env = container
        .env
        .iter()
        .flatten()
        .filter_map(|var| var.value_from.as_ref())
        .filter_map(|source| source.secret_key_ref.as_ref())
        .any(|key_ref| key_ref.name == secret_name);

    from_env_from || from_env
}

fn volume_uses_secret(volume: &Volume, secret_name: &str) -> bool {
    let direct = volume
        .secret
        .as_ref()
        .and_then(|s| s.secret_name.as_deref())
        .is_some_and(|name| name == secret_name);

    let projected = volume
        .projected
        .as_ref()
        .and_then(|p| p.sources.as_ref())
        .is_some_and(|sources| {
            sources
                .iter()
                .filter_map(|source| source.secret.as_ref())
                .any(|projection| projection.name == secret_name)
        });

    direct || projected
}
