// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Restarting workloads when a secret they consume changes.

pub mod annotations;
pub mod fleet;
pub mod matcher;
pub mod workload;

pub use annotations::{annotation_key, secret_version};
pub use fleet::{FleetCoordinator, FleetReport};
pub use matcher::uses_secret;
pub use workload::reconcile_workload;
