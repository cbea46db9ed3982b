use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::WatchEvent;
use kube::api::WatchParams;
use kube::Api;
use kube::Client;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::domain::reconcile::PodEvent;
use crate::domain::reconcile::PodSnapshot;

/// Delay before reconnecting after a failed watch request.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Resource version that asks the API server for its current state.
const ANY_RESOURCE_VERSION: &str = "0";
/// Status the API server sends when the requested resource version is too old.
const STATUS_GONE: u16 = 410;

/// Watches Kubernetes pods and turns their changes into [`PodEvent`]s.
///
/// The watch is resumed from the last seen resource version whenever the
/// connection drops, so consumers see one continuous stream.
pub struct PodWatcher {
    client: Client,
    namespace: Option<String>,
}

impl PodWatcher {
    /// Create a new pod watcher.
    ///
    /// # Arguments
    ///
    /// * `client` - Kubernetes client used for the watch requests
    /// * `namespace` - Kubernetes namespace to watch (None for all namespaces)
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    fn api(&self) -> Api<Pod> {
        match &self.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    /// Endless stream of pod events.
    ///
    /// Transport failures never end the stream; the watch is re-established
    /// and resumed instead.
    pub fn events(&self) -> impl Stream<Item = PodEvent> + Send + 'static {
        let api = self.api();
        let namespace = self.namespace.clone();

        stream! {
            info!(namespace = ?namespace, "Starting pod watcher");
            let params = WatchParams::default();
            let mut resource_version = ANY_RESOURCE_VERSION.to_string();

            loop {
                let mut watch = match api.watch(&params, &resource_version).await {
                    Ok(watch) => watch.boxed(),
                    Err(e) => {
                        error!("Pod watch failed: {e}");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                };

                while let Some(event) = watch.next().await {
                    match event {
                        Ok(event) => {
                            if let Some(event) = translate(event, &mut resource_version) {
                                yield event;
                            }
                        }
                        Err(e) => {
                            warn!("Pod watch stream error: {e}, reconnecting");
                            break;
                        }
                    }
                }

                debug!("Pod watch ended, resuming from resource version {resource_version}");
            }
        }
    }
}

/// Map a raw watch event, remembering the resource version to resume from.
fn translate(event: WatchEvent<Pod>, resource_version: &mut String) -> Option<PodEvent> {
    match event {
        WatchEvent::Added(pod) => {
            remember_version(&pod, resource_version);
            Some(PodEvent::Added(PodSnapshot::from(&pod)))
        }
        WatchEvent::Modified(pod) => {
            remember_version(&pod, resource_version);
            Some(PodEvent::Modified(PodSnapshot::from(&pod)))
        }
        WatchEvent::Deleted(pod) => {
            remember_version(&pod, resource_version);
            Some(PodEvent::Deleted(PodSnapshot::from(&pod)))
        }
        WatchEvent::Bookmark(bookmark) => {
            *resource_version = bookmark.metadata.resource_version;
            None
        }
        WatchEvent::Error(e) if e.code == STATUS_GONE => {
            warn!(
                "Pod watch resource version {resource_version} expired, restarting from current state"
            );
            *resource_version = ANY_RESOURCE_VERSION.to_string();
            None
        }
        WatchEvent::Error(e) => {
            warn!("Pod watch reported error: {e}");
            Some(PodEvent::Unknown {
                kind: format!("Error({})", e.code),
            })
        }
    }
}

fn remember_version(pod: &Pod, resource_version: &mut String) {
    if let Some(version) = &pod.metadata.resource_version {
        resource_version.clone_from(version);
    }
}
