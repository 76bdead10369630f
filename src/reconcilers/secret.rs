// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret reconciler - watches Secrets and rolls the workloads consuming managed ones.

use crate::config::Config;
use crate::constants::requeue::ERROR_REQUEUE_SECS;
use crate::error::{Result, RolloutError};
use crate::kubernetes::KubeControlPlane;
use crate::rollout::{secret_version, FleetCoordinator};
use crate::types::ManagedSecretRef;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct SecretReconciler {
    client: Client,
    config: Config,
    coordinator: FleetCoordinator<KubeControlPlane>,
}

impl SecretReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        let control_plane = KubeControlPlane::new(client.clone(), config.list_page_size);
        let coordinator =
            FleetCoordinator::new(control_plane).with_max_concurrency(config.max_concurrent_updates);

        Self {
            client,
            config,
            coordinator,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let secrets: Api<Secret> = match &self.config.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };
        let context = Arc::new(self);

        Controller::new(secrets, WatcherConfig::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled secret: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(secret: Arc<Secret>, ctx: Arc<SecretReconciler>) -> Result<Action> {
    let secret_ref = ManagedSecretRef::from_secret(&secret);

    let Some(version) = secret_version(&secret) else {
        debug!("Secret {} is not managed, skipping", secret_ref);
        return Ok(Action::await_change());
    };

    debug!("Reconciling secret {} at version {}", secret_ref, version);

    let report = ctx.coordinator.reconcile_all(&secret_ref).await?;
    if report.updated > 0 {
        info!(
            "Secret {} at version {}: restarted {} of {} consuming workloads",
            secret_ref,
            version,
            report.updated,
            report.reconciled()
        );
    }

    // Nothing to do until the secret changes again
    Ok(Action::await_change())
}

fn error_policy(secret: Arc<Secret>, error: &RolloutError, _ctx: Arc<SecretReconciler>) -> Action {
    error!(
        "Reconciliation of secret {}/{} failed: {}",
        secret.namespace().unwrap_or_default(),
        secret.name_any(),
        error
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
}
