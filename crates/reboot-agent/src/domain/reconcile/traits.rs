//! Traits the reconciliation core needs from its collaborators

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use error_stack::Report;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::apps::v1::ReplicaSet;

use crate::infrastructure::k8s::KubernetesError;

/// Read/write access to the workload resources a restart touches.
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    /// Fetch a replica set by name and namespace.
    async fn get_replica_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ReplicaSet, Report<KubernetesError>>;

    /// Fetch a deployment by name and namespace.
    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, Report<KubernetesError>>;

    /// Replace a deployment wholesale.
    ///
    /// Fails with [`KubernetesError::Conflict`] when the stored object changed
    /// since `deployment` was read.
    async fn replace_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, Report<KubernetesError>>;
}

/// Trait for getting current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
