//! Test adapters implementing the reconciliation traits

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration as ChronoDuration;
use chrono::TimeZone;
use chrono::Utc;
use error_stack::Report;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

use super::status::Status;
use super::status::StatusSink;
use super::traits::Clock;
use super::traits::ResourceAccessor;
use super::types::OwnerRef;
use super::types::PodSnapshot;
use crate::infrastructure::k8s::KubernetesError;

/// How the mock answers the next replace call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReplaceResponse {
    Accept,
    Conflict,
    Fail,
}

/// A recorded accessor call, `namespace/name` of the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    GetReplicaSet(String),
    GetDeployment(String),
    ReplaceDeployment(String),
}

type Key = (String, String);

fn key(name: &str, namespace: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// In-memory cluster with scripted replace answers.
///
/// Replace calls are answered from the script in order and accepted once the
/// script runs out.
#[derive(Default)]
pub(crate) struct MockResourceAccessor {
    replica_sets: Mutex<HashMap<Key, ReplicaSet>>,
    deployments: Mutex<HashMap<Key, Deployment>>,
    replace_script: Mutex<VecDeque<ReplaceResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl MockResourceAccessor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a replica set owned by `owners` (kind, name).
    pub(crate) fn with_replica_set(
        mut self,
        name: &str,
        namespace: &str,
        owners: &[(&str, &str)],
    ) -> Self {
        let owner_references = owners
            .iter()
            .map(|(kind, owner)| OwnerReference {
                api_version: "apps/v1".to_string(),
                kind: kind.to_string(),
                name: owner.to_string(),
                uid: format!("uid-{owner}"),
                controller: Some(true),
                ..Default::default()
            })
            .collect();
        let replica_set = ReplicaSet {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                owner_references: Some(owner_references),
                ..Default::default()
            },
            ..Default::default()
        };
        self.replica_sets
            .get_mut()
            .unwrap()
            .insert(key(name, namespace), replica_set);
        self
    }

    pub(crate) fn with_deployment(mut self, name: &str, namespace: &str) -> Self {
        self.deployments
            .get_mut()
            .unwrap()
            .insert(key(name, namespace), deployment(name, namespace));
        self
    }

    pub(crate) fn with_stored_deployment(mut self, deployment: Deployment) -> Self {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let namespace = deployment.metadata.namespace.clone().unwrap_or_default();
        self.deployments
            .get_mut()
            .unwrap()
            .insert(key(&name, &namespace), deployment);
        self
    }

    pub(crate) fn with_replace_script(
        mut self,
        responses: impl IntoIterator<Item = ReplaceResponse>,
    ) -> Self {
        self.replace_script.get_mut().unwrap().extend(responses);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn replace_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::ReplaceDeployment(_)))
            .count()
    }

    pub(crate) fn deployment(&self, name: &str, namespace: &str) -> Option<Deployment> {
        self.deployments
            .lock()
            .unwrap()
            .get(&key(name, namespace))
            .cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ResourceAccessor for MockResourceAccessor {
    async fn get_replica_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ReplicaSet, Report<KubernetesError>> {
        self.record(Call::GetReplicaSet(format!("{namespace}/{name}")));
        self.replica_sets
            .lock()
            .unwrap()
            .get(&key(name, namespace))
            .cloned()
            .ok_or_else(|| {
                Report::new(KubernetesError::NotFound {
                    kind: "ReplicaSet",
                    name: name.to_string(),
                    namespace: namespace.to_string(),
                })
            })
    }

    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, Report<KubernetesError>> {
        self.record(Call::GetDeployment(format!("{namespace}/{name}")));
        self.deployment(name, namespace).ok_or_else(|| {
            Report::new(KubernetesError::NotFound {
                kind: "Deployment",
                name: name.to_string(),
                namespace: namespace.to_string(),
            })
        })
    }

    async fn replace_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, Report<KubernetesError>> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let namespace = deployment.metadata.namespace.clone().unwrap_or_default();
        self.record(Call::ReplaceDeployment(format!("{namespace}/{name}")));

        let response = self
            .replace_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ReplaceResponse::Accept);
        match response {
            ReplaceResponse::Accept => {
                let mut stored = deployment.clone();
                let version = stored
                    .metadata
                    .resource_version
                    .as_deref()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                stored.metadata.resource_version = Some((version + 1).to_string());
                self.deployments
                    .lock()
                    .unwrap()
                    .insert(key(&name, &namespace), stored.clone());
                Ok(stored)
            }
            ReplaceResponse::Conflict => Err(Report::new(KubernetesError::Conflict {
                kind: "Deployment",
                name,
                namespace,
            })),
            ReplaceResponse::Fail => Err(Report::new(KubernetesError::RequestFailed {
                kind: "Deployment",
                name,
                namespace,
                message: "connection reset by peer".to_string(),
            })),
        }
    }
}

/// A deployment whose pod template carries no annotations.
pub(crate) fn deployment(name: &str, namespace: &str) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some("1".to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(2),
            ..Default::default()
        }),
        status: None,
    }
}

/// Annotations on the pod template of a deployment, if any.
pub(crate) fn template_annotations(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.metadata.as_ref())
        .and_then(|metadata| metadata.annotations.clone())
        .unwrap_or_default()
}

/// A pod in `namespace` with the given annotations and owners (kind, name).
pub(crate) fn pod(
    name: &str,
    namespace: &str,
    annotations: &[(&str, &str)],
    owners: &[(&str, &str)],
) -> PodSnapshot {
    PodSnapshot {
        name: name.to_string(),
        namespace: namespace.to_string(),
        markers: annotations
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        owner_references: owners
            .iter()
            .map(|(kind, owner)| OwnerRef::new(*kind, *owner))
            .collect(),
    }
}

/// Sink remembering every status it was given.
#[derive(Default)]
pub(crate) struct RecordingSink {
    statuses: Mutex<Vec<Status>>,
}

impl RecordingSink {
    pub(crate) fn statuses(&self) -> Vec<Status> {
        self.statuses.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn emit(&self, status: Status) {
        self.statuses.lock().unwrap().push(status);
    }
}

/// Clock starting at a fixed instant and advancing one second per reading.
pub(crate) struct SteppingClock {
    start: DateTime<Utc>,
    readings: AtomicI64,
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            readings: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.readings.fetch_add(1, Ordering::Relaxed);
        self.start + ChronoDuration::seconds(n)
    }
}
