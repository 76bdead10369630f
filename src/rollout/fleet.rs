// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Rolls every opted-in consumer of a managed secret in one pass.

use crate::error::{FleetFailure, Result, RolloutError, WorkloadFailure};
use crate::kubernetes::{ControlPlane, Workload};
use crate::rollout::annotations::{is_auto_reload_enabled, secret_version};
use crate::rollout::matcher::uses_secret;
use crate::rollout::workload::reconcile_workload;
use crate::types::ManagedSecretRef;
use futures::{stream, StreamExt};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Outcome of a successful pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FleetReport {
    /// Workloads found in the namespace
    pub listed: usize,
    /// Workloads that opted in and consume the secret
    pub eligible: usize,
    /// Eligible workloads that were restarted
    pub updated: usize,
    /// Eligible workloads that already carried the current version
    pub up_to_date: usize,
}

impl FleetReport {
    /// Number of workloads the pass reconciled
    pub fn reconciled(&self) -> usize {
        self.eligible
    }

    fn merge(&mut self, other: FleetReport) {
        self.listed += other.listed;
        self.eligible += other.eligible;
        self.updated += other.updated;
        self.up_to_date += other.up_to_date;
    }
}

/// Fans workload reconciliation out over every consumer of a managed secret.
pub struct FleetCoordinator<C> {
    control_plane: C,
    max_concurrency: Option<usize>,
}

impl<C: ControlPlane> FleetCoordinator<C> {
    pub fn new(control_plane: C) -> Self {
        Self {
            control_plane,
            max_concurrency: None,
        }
    }

    /// Cap the number of workload updates in flight; `None` updates all eligible workloads at once
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.filter(|n| *n > 0);
        self
    }

    pub fn control_plane(&self) -> &C {
        &self.control_plane
    }

    /// Reconcile every workload of kind `W` in the secret's namespace.
    ///
    /// Listing and fetching the secret are fatal. Update failures are collected until every
    /// eligible workload has been tried and then returned together as
    /// [`RolloutError::WorkloadFailures`]; updates that did succeed stay in place.
    #[instrument(skip(self, secret_ref), fields(secret = %secret_ref))]
    pub async fn reconcile_fleet<W: Workload>(
        &self,
        secret_ref: &ManagedSecretRef,
    ) -> Result<FleetReport> {
        let workloads = self
            .control_plane
            .list_workloads::<W>(&secret_ref.namespace)
            .await?;
        let secret = self.fetch_managed_secret(secret_ref).await?;

        self.roll_out(workloads, &secret).await
    }

    /// Reconcile Deployments, StatefulSets and DaemonSets against one snapshot of the secret.
    ///
    /// Every kind is listed before the first update is issued, so a listing failure leaves the
    /// cluster untouched. Update failures of all kinds end up in one [`FleetFailure`] whose
    /// eligible count covers every kind.
    #[instrument(skip(self, secret_ref), fields(secret = %secret_ref))]
    pub async fn reconcile_all(&self, secret_ref: &ManagedSecretRef) -> Result<FleetReport> {
        let secret = self.fetch_managed_secret(secret_ref).await?;

        let namespace = &secret_ref.namespace;
        let deployments = self.control_plane.list_workloads::<Deployment>(namespace).await?;
        let statefulsets = self.control_plane.list_workloads::<StatefulSet>(namespace).await?;
        let daemonsets = self.control_plane.list_workloads::<DaemonSet>(namespace).await?;

        let mut report = FleetReport::default();
        let mut failures = Vec::new();

        let outcome = self.roll_out(deployments, &secret).await;
        absorb(outcome, &mut report, &mut failures)?;
        let outcome = self.roll_out(statefulsets, &secret).await;
        absorb(outcome, &mut report, &mut failures)?;
        let outcome = self.roll_out(daemonsets, &secret).await;
        absorb(outcome, &mut report, &mut failures)?;

        if !failures.is_empty() {
            return Err(FleetFailure {
                eligible: report.eligible,
                failures,
            }
            .into());
        }

        Ok(report)
    }

    async fn fetch_managed_secret(&self, secret_ref: &ManagedSecretRef) -> Result<Secret> {
        let secret = self.control_plane.get_secret(secret_ref).await?;
        if secret_version(&secret).is_none() {
            return Err(RolloutError::MissingVersion(secret_ref.to_string()));
        }
        Ok(secret)
    }

    async fn roll_out<W: Workload>(&self, workloads: Vec<W>, secret: &Secret) -> Result<FleetReport> {
        let listed = workloads.len();
        let secret_name = secret.name_any();

        // Keyed by identity so no workload is handed to two units
        let eligible: BTreeMap<(String, String), W> = workloads
            .into_iter()
            .filter(|w| is_auto_reload_enabled(w) && uses_secret(w, &secret_name))
            .map(|w| ((w.namespace().unwrap_or_default(), w.name_any()), w))
            .collect();

        let mut report = FleetReport {
            listed,
            eligible: eligible.len(),
            ..Default::default()
        };

        if eligible.is_empty() {
            debug!(
                "None of the {} {} workloads consume secret {}",
                listed,
                W::kind(&()),
                secret_name
            );
            return Ok(report);
        }

        info!(
            "Reconciling {} of {} {} workloads against secret {}",
            report.eligible,
            listed,
            W::kind(&()),
            secret_name
        );

        let limit = self.max_concurrency.unwrap_or(report.eligible).max(1);
        let control_plane = &self.control_plane;
        let results: Vec<(String, Result<bool>)> = stream::iter(eligible.into_values())
            .map(|workload| async move {
                let name = workload.describe();
                (name, reconcile_workload(control_plane, workload, secret).await)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut failures = Vec::new();
        for (workload, result) in results {
            match result {
                Ok(true) => report.updated += 1,
                Ok(false) => report.up_to_date += 1,
                Err(error) => {
                    warn!("Failed to reconcile {}: {}", workload, error);
                    failures.push(WorkloadFailure { workload, error });
                }
            }
        }

        if !failures.is_empty() {
            return Err(FleetFailure {
                eligible: report.eligible,
                failures,
            }
            .into());
        }

        info!(
            "Restarted {} workloads, {} already up to date",
            report.updated, report.up_to_date
        );
        Ok(report)
    }
}

/// Fold the outcome for one workload kind into the running totals.
/// Failed kinds still count their eligible workloads. Anything other than per-workload
/// failures aborts the pass.
fn absorb(
    outcome: Result<FleetReport>,
    report: &mut FleetReport,
    failures: &mut Vec<WorkloadFailure>,
) -> Result<()> {
    match outcome {
        Ok(r) => report.merge(r),
        Err(RolloutError::WorkloadFailures(f)) => {
            report.eligible += f.eligible;
            failures.extend(f.failures);
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
