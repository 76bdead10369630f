// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes access: workload kinds and the control-plane operations used by a rollout.

pub mod control_plane;
pub mod workload;

pub use control_plane::{ControlPlane, KubeControlPlane};
pub use workload::Workload;
