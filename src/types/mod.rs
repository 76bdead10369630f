// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Value types shared by the rollout core.

pub mod secret;

pub use secret::{ManagedSecretRef, VersionStamp};
