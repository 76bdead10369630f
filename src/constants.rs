// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by secret-rollout
pub mod annotations {
    /// Prefix of the per-secret version annotation, joined to the secret name with a '.'
    pub const MANAGED_SECRET_PREFIX: &str = "secret-rollout.geeko.me/managed-secret";
    /// Fallback version annotation on a managed secret
    pub const VERSION: &str = "secret-rollout.geeko.me/version";
    /// When set to "true" on a workload, it is restarted whenever a secret it consumes changes
    pub const AUTO_RELOAD: &str = "secret-rollout.geeko.me/auto-reload";
}

/// The operator name, used as field manager on updates
pub const OPERATOR_NAME: &str = "secret-rollout";

/// Reconciliation timing
pub mod requeue {
    /// Delay before a failed pass is retried
    pub const ERROR_REQUEUE_SECS: u64 = 60;
}

/// Default page size for workload list calls
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 500;
