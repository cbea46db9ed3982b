use async_trait::async_trait;
use error_stack::Report;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::apps::v1::ReplicaSet;
use kube::api::PostParams;
use kube::Api;
use kube::Client;
use kube::ResourceExt;

use crate::domain::reconcile::ResourceAccessor;
use crate::infrastructure::k8s::types::KubernetesError;

/// [`ResourceAccessor`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeResourceAccessor {
    client: Client,
}

impl KubeResourceAccessor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn api_error(
    err: kube::Error,
    kind: &'static str,
    name: &str,
    namespace: &str,
) -> Report<KubernetesError> {
    Report::new(KubernetesError::from_api_error(&err, kind, name, namespace))
        .attach_printable(format!("Kubernetes API error: {err}"))
}

#[async_trait]
impl ResourceAccessor for KubeResourceAccessor {
    async fn get_replica_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ReplicaSet, Report<KubernetesError>> {
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| api_error(e, "ReplicaSet", name, namespace))
    }

    async fn get_deployment(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, Report<KubernetesError>> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| api_error(e, "Deployment", name, namespace))
    }

    async fn replace_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, Report<KubernetesError>> {
        let name = deployment.name_any();
        let namespace = deployment.namespace().ok_or_else(|| {
            Report::new(KubernetesError::InvalidResource {
                kind: "Deployment",
                name: name.clone(),
                namespace: String::new(),
                message: "deployment has no namespace".to_string(),
            })
        })?;

        let api: Api<Deployment> = Api::namespaced(self.client.clone(), &namespace);
        // the carried resourceVersion makes the API server reject stale writes with 409
        api.replace(&name, &PostParams::default(), deployment)
            .await
            .map_err(|e| api_error(e, "Deployment", &name, &namespace))
    }
}
