// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::fmt;

/// Identifies the authoritative secret whose version drives a rollout pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManagedSecretRef {
    pub namespace: String,
    pub name: String,
}

impl ManagedSecretRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Build a reference from a live secret, falling back to the "default" namespace
    pub fn from_secret(secret: &Secret) -> Self {
        Self::new(
            secret.namespace().unwrap_or_else(|| "default".to_string()),
            secret.name_any(),
        )
    }
}

impl fmt::Display for ManagedSecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Opaque marker of which secret content was last applied. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionStamp(String);

impl VersionStamp {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VersionStamp {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
