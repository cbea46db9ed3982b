use std::sync::Arc;

use error_stack::Report;

use super::traits::ResourceAccessor;
use super::types::owner_refs;
use super::types::DeploymentTarget;
use super::types::OwnerRef;
use super::types::DEPLOYMENT_KIND;
use crate::infrastructure::k8s::KubernetesError;

/// Walks owner references from a replica set up to its deployments.
pub struct OwnerResolver {
    accessor: Arc<dyn ResourceAccessor>,
}

impl OwnerResolver {
    pub fn new(accessor: Arc<dyn ResourceAccessor>) -> Self {
        Self { accessor }
    }

    /// Deployments listed as owners of `replica_set` in `namespace`, in
    /// encounter order. Empty when the replica set is not deployment-managed.
    ///
    /// # Errors
    ///
    /// - any error from fetching the replica set
    pub async fn deployments_owning(
        &self,
        replica_set: &OwnerRef,
        namespace: &str,
    ) -> Result<Vec<DeploymentTarget>, Report<KubernetesError>> {
        let replica_set = self
            .accessor
            .get_replica_set(&replica_set.name, namespace)
            .await?;

        Ok(owner_refs(&replica_set.metadata)
            .into_iter()
            .filter(|owner| owner.kind == DEPLOYMENT_KIND)
            .map(|owner| DeploymentTarget {
                name: owner.name,
                namespace: namespace.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::reconcile::mock::MockResourceAccessor;

    fn target(name: &str) -> DeploymentTarget {
        DeploymentTarget {
            name: name.to_string(),
            namespace: "prod".to_string(),
        }
    }

    #[test(tokio::test)]
    async fn replica_set_owned_by_deployment() {
        let accessor = Arc::new(MockResourceAccessor::new().with_replica_set(
            "rs-abc",
            "prod",
            &[("Deployment", "web")],
        ));
        let resolver = OwnerResolver::new(accessor);

        let targets = resolver
            .deployments_owning(&OwnerRef::new("ReplicaSet", "rs-abc"), "prod")
            .await
            .expect("should resolve");

        assert_eq!(targets, vec![target("web")]);
    }

    #[test(tokio::test)]
    async fn non_deployment_owners_are_skipped() {
        let accessor = Arc::new(MockResourceAccessor::new().with_replica_set(
            "rs-abc",
            "prod",
            &[("Rollout", "canary"), ("Deployment", "web"), ("Deployment", "web-shadow")],
        ));
        let resolver = OwnerResolver::new(accessor);

        let targets = resolver
            .deployments_owning(&OwnerRef::new("ReplicaSet", "rs-abc"), "prod")
            .await
            .expect("should resolve");

        assert_eq!(targets, vec![target("web"), target("web-shadow")]);
    }

    #[test(tokio::test)]
    async fn bare_replica_set_has_no_targets() {
        let accessor = Arc::new(MockResourceAccessor::new().with_replica_set("rs-abc", "prod", &[]));
        let resolver = OwnerResolver::new(accessor);

        let targets = resolver
            .deployments_owning(&OwnerRef::new("ReplicaSet", "rs-abc"), "prod")
            .await
            .expect("should resolve");

        assert!(targets.is_empty());
    }

    #[test(tokio::test)]
    async fn missing_replica_set_is_an_error() {
        let accessor = Arc::new(MockResourceAccessor::new());
        let resolver = OwnerResolver::new(accessor);

        let err = resolver
            .deployments_owning(&OwnerRef::new("ReplicaSet", "rs-gone"), "prod")
            .await
            .expect_err("should fail");

        assert!(matches!(
            err.current_context(),
            KubernetesError::NotFound { kind: "ReplicaSet", .. }
        ));
    }
}
