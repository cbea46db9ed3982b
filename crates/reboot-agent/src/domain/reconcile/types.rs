use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Owner kind a pod is expected to point at.
pub const REPLICA_SET_KIND: &str = "ReplicaSet";
/// Owner kind a replica set is expected to point at.
pub const DEPLOYMENT_KIND: &str = "Deployment";

/// Back-reference from a resource to the resource controlling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
}

impl OwnerRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Owner references of an object, in the order the API server lists them.
pub fn owner_refs(metadata: &ObjectMeta) -> Vec<OwnerRef> {
    metadata
        .owner_references
        .iter()
        .flatten()
        .map(|owner| OwnerRef::new(&owner.kind, &owner.name))
        .collect()
}

/// Immutable view of a pod as delivered by one watch event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub markers: BTreeMap<String, String>,
    pub owner_references: Vec<OwnerRef>,
}

impl PodSnapshot {
    /// Owner references of the given kind, in encounter order.
    pub fn owners_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a OwnerRef> + 'a {
        self.owner_references
            .iter()
            .filter(move |owner| owner.kind == kind)
    }
}

impl From<&Pod> for PodSnapshot {
    fn from(pod: &Pod) -> Self {
        let metadata = &pod.metadata;
        Self {
            name: metadata.name.clone().unwrap_or_else(|| "unknown".to_string()),
            namespace: metadata
                .namespace
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            markers: metadata.annotations.clone().unwrap_or_default(),
            owner_references: owner_refs(metadata),
        }
    }
}

/// A pod change as seen by the event stream consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodEvent {
    Added(PodSnapshot),
    Modified(PodSnapshot),
    Deleted(PodSnapshot),
    /// Anything the watch source could not map onto the kinds above.
    Unknown { kind: String },
}

/// A deployment selected for a rolling restart.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{namespace}/{name}")]
pub struct DeploymentTarget {
    pub name: String,
    pub namespace: String,
}
