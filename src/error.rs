// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RolloutError {
    #[error("Unable to list {kind} workloads in namespace {namespace}: {source}")]
    ListWorkloads {
        kind: String,
        namespace: String,
        source: kube::Error,
    },

    #[error("Unable to fetch managed secret {secret}: {source}")]
    SecretFetch { secret: String, source: kube::Error },

    #[error("Managed secret {0} has no version annotation")]
    MissingVersion(String),

    #[error("Failed to update {workload}: {source}")]
    WorkloadUpdate {
        workload: String,
        source: kube::Error,
    },

    #[error(transparent)]
    WorkloadFailures(#[from] FleetFailure),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RolloutError>;

/// A single workload that could not be brought up to date during a pass.
#[derive(Debug)]
pub struct WorkloadFailure {
    /// `<kind> <namespace>/<name>`
    pub workload: String,
    pub error: RolloutError,
}

/// Every failure of a fleet pass, together with the number of workloads that were attempted.
#[derive(Error, Debug)]
#[error(
    "Unable to reconcile {} of {} workloads: {}",
    .failures.len(),
    .eligible,
    describe(.failures)
)]
pub struct FleetFailure {
    pub eligible: usize,
    pub failures: Vec<WorkloadFailure>,
}

fn describe(failures: &[WorkloadFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("[{}: {}]", f.workload, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}
