// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API server and an in-memory control plane.

use crate::constants::annotations;
use crate::error::{Result, RolloutError};
use crate::kubernetes::{ControlPlane, Workload};
use crate::types::ManagedSecretRef;
use async_trait::async_trait;
use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Secret;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request received by the [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Several responses registered for the same method and path are served in order,
/// the last one is repeated once the queue is down to a single entry.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    /// Shared handle on every request this service has received so far
    pub fn requests(&self) -> Arc<Mutex<Vec<RecordedRequest>>> {
        self.requests.clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(|q| q.to_string());

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body = match req.into_body().collect().await {
                Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).to_string(),
                Err(_) => String::new(),
            };
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                query,
                body,
            });

            let (status, body) = response.unwrap_or_else(|| (404, not_found_json("resource", "unknown")));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Create a Kubernetes Status failure body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Build a kube API error the way the client surfaces it
pub fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: reason.to_string(),
        code,
    })
}

/// In-memory stand-in for the Kubernetes API.
///
/// Workloads of every kind are stored as JSON so one fake serves all [`Workload`] types.
#[derive(Default)]
pub struct InMemoryControlPlane {
    workloads: Mutex<BTreeMap<(String, String, String), Value>>,
    secrets: Mutex<BTreeMap<(String, String), Secret>>,
    failing_updates: Mutex<HashSet<String>>,
    fail_listing: AtomicBool,
    failing_lists: Mutex<HashSet<String>>,
    update_calls: Mutex<Vec<String>>,
}

impl InMemoryControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workload<W: Workload>(self, workload: W) -> Self {
        self.store(&workload);
        self
    }

    pub fn with_secret(self, secret: Secret) -> Self {
        let key = (secret.namespace().unwrap_or_default(), secret.name_any());
        self.secrets.lock().unwrap().insert(key, secret);
        self
    }

    /// Reject every update of a workload with this name with a 409 conflict
    pub fn fail_updates_of(self, name: &str) -> Self {
        self.failing_updates.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn fail_listing(self) -> Self {
        self.fail_listing.store(true, Ordering::SeqCst);
        self
    }

    /// Fail listing of one workload kind only, e.g. `"StatefulSet"`
    pub fn fail_listing_of(self, kind: &str) -> Self {
        self.failing_lists.lock().unwrap().insert(kind.to_string());
        self
    }

    /// Every update attempt so far, successful or not
    pub fn update_calls(&self) -> Vec<String> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn workload<W: Workload>(&self, namespace: &str, name: &str) -> Option<W> {
        let key = (W::kind(&()).to_string(), namespace.to_string(), name.to_string());
        self.workloads
            .lock()
            .unwrap()
            .get(&key)
            .map(|v| serde_json::from_value(v.clone()).expect("stored workload deserializes"))
    }

    fn store<W: Workload>(&self, workload: &W) {
        let key = (
            W::kind(&()).to_string(),
            workload.namespace().unwrap_or_default(),
            workload.name_any(),
        );
        let value = serde_json::to_value(workload).expect("workload serializes");
        self.workloads.lock().unwrap().insert(key, value);
    }
}

#[async_trait]
impl ControlPlane for InMemoryControlPlane {
    async fn list_workloads<W: Workload>(&self, namespace: &str) -> Result<Vec<W>> {
        let kind = W::kind(&()).to_string();
        let failing = self.fail_listing.load(Ordering::SeqCst)
            || self.failing_lists.lock().unwrap().contains(&kind);
        if failing {
            return Err(RolloutError::ListWorkloads {
                kind,
                namespace: namespace.to_string(),
                source: api_error(500, "InternalError", "etcd unavailable"),
            });
        }

        Ok(self
            .workloads
            .lock()
            .unwrap()
            .iter()
            .filter(|((k, ns, _), _)| *k == kind && ns == namespace)
            .map(|(_, v)| serde_json::from_value(v.clone()).expect("stored workload deserializes"))
            .collect())
    }

    async fn get_secret(&self, secret: &ManagedSecretRef) -> Result<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(secret.namespace.clone(), secret.name.clone()))
            .cloned()
            .ok_or_else(|| RolloutError::SecretFetch {
                secret: secret.to_string(),
                source: api_error(404, "NotFound", "secret not found"),
            })
    }

    async fn update_workload<W: Workload>(&self, workload: &W) -> Result<W> {
        let name = workload.name_any();
        self.update_calls.lock().unwrap().push(name.clone());

        if self.failing_updates.lock().unwrap().contains(&name) {
            return Err(RolloutError::WorkloadUpdate {
                workload: workload.describe(),
                source: api_error(409, "Conflict", "the object has been modified"),
            });
        }

        self.store(workload);
        Ok(workload.clone())
    }
}

/// A managed secret carrying `version` under its derived annotation key
pub fn managed_secret(namespace: &str, name: &str, version: &str) -> Secret {
    let key = format!("{}.{}", annotations::MANAGED_SECRET_PREFIX, name);
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "annotations": { key: version }
        },
        "data": { "password": "aHVudGVyMg==" }
    }))
    .expect("valid secret")
}

/// Workload annotations that opt in to automatic rollouts
pub fn opted_in() -> Value {
    json!({ (annotations::AUTO_RELOAD): "true" })
}

/// Raw JSON for an apps/v1 workload with the given pod spec
pub fn workload_json(
    kind: &str,
    namespace: &str,
    name: &str,
    annotations: Value,
    template_annotations: Value,
    pod_spec: Value,
) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": kind,
        "metadata": {
            "name": name,
            "namespace": namespace,
            "annotations": annotations
        },
        "spec": {
            "serviceName": name,
            "selector": { "matchLabels": { "app": name } },
            "template": {
                "metadata": {
                    "labels": { "app": name },
                    "annotations": template_annotations
                },
                "spec": pod_spec
            }
        }
    })
}

/// A Deployment with the given workload annotations and pod spec
pub fn deployment(
    namespace: &str,
    name: &str,
    annotations: Value,
    pod_spec: Value,
) -> k8s_openapi::api::apps::v1::Deployment {
    serde_json::from_value(workload_json(
        "Deployment",
        namespace,
        name,
        annotations,
        json!({}),
        pod_spec,
    ))
    .expect("valid deployment")
}

/// Pod spec whose only container pulls every key of `secret` in via envFrom
pub fn env_from_pod(secret: &str) -> Value {
    json!({
        "containers": [{
            "name": "app",
            "image": "nginx",
            "envFrom": [{ "secretRef": { "name": secret } }]
        }]
    })
}

/// Pod spec with no secret references at all
pub fn plain_pod() -> Value {
    json!({
        "containers": [{
            "name": "app",
            "image": "nginx",
            "env": [{ "name": "MODE", "value": "production" }]
        }]
    })
}
