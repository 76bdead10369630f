// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The Kubernetes operations a rollout pass needs, behind a trait so tests can swap them out

use crate::constants::OPERATOR_NAME;
use crate::error::{Result, RolloutError};
use crate::kubernetes::Workload;
use crate::types::ManagedSecretRef;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{ListParams, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

/// Access to the cluster state a rollout pass reads and writes.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// List every workload of kind `W` in a namespace
    async fn list_workloads<W: Workload>(&self, namespace: &str) -> Result<Vec<W>>;

    /// Fetch the authoritative secret
    async fn get_secret(&self, secret: &ManagedSecretRef) -> Result<Secret>;

    /// Replace a workload with the given object (full update, not a patch)
    async fn update_workload<W: Workload>(&self, workload: &W) -> Result<W>;
}

/// [`ControlPlane`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
    page_size: u32,
}

impl KubeControlPlane {
    pub fn new(client: Client, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    #[instrument(skip(self))]
    async fn list_workloads<W: Workload>(&self, namespace: &str) -> Result<Vec<W>> {
        let api: Api<W> = Api::namespaced(self.client.clone(), namespace);
        let mut params = ListParams::default().limit(self.page_size);
        let mut items = Vec::new();

        loop {
            let page = api
                .list(&params)
                .await
                .map_err(|source| RolloutError::ListWorkloads {
                    kind: W::kind(&()).to_string(),
                    namespace: namespace.to_string(),
                    source,
                })?;
            items.extend(page.items);

            match page.metadata.continue_ {
                Some(token) if !token.is_empty() => {
                    debug!("Fetching next page of {} workloads", W::kind(&()));
                    params = params.continue_token(&token);
                }
                _ => break,
            }
        }

        debug!("Listed {} {} workloads", items.len(), W::kind(&()));
        Ok(items)
    }

    #[instrument(skip(self, secret), fields(secret = %secret))]
    async fn get_secret(&self, secret: &ManagedSecretRef) -> Result<Secret> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &secret.namespace);
        secrets
            .get(&secret.name)
            .await
            .map_err(|source| RolloutError::SecretFetch {
                secret: secret.to_string(),
                source,
            })
    }

    #[instrument(skip(self, workload), fields(workload = %workload.describe()))]
    async fn update_workload<W: Workload>(&self, workload: &W) -> Result<W> {
        let namespace = workload.namespace().unwrap_or_default();
        let api: Api<W> = Api::namespaced(self.client.clone(), &namespace);
        let pp = PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        };

        api.replace(&workload.name_any(), &pp, workload)
            .await
            .map_err(|source| RolloutError::WorkloadUpdate {
                workload: workload.describe(),
                source,
            })
    }
}
