use std::sync::Arc;

use futures::Stream;
use futures::StreamExt;
use tokio::select;
use tokio::task::JoinError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::annotations::RebootMarker;
use super::restart::RestartExecutor;
use super::status::Status;
use super::status::StatusSink;
use super::types::PodEvent;
use super::types::PodSnapshot;
use crate::config::RebootConfig;

/// Reads pod events in order and dispatches reboot requests.
///
/// Each reboot request runs as its own task in a [`JoinSet`], so a slow or
/// backing-off restart never holds up the next event. Failures and panics of
/// those tasks are logged and reported without touching the stream.
pub struct EventConsumer {
    config: Arc<RebootConfig>,
    executor: Arc<RestartExecutor>,
    sink: Arc<dyn StatusSink>,
    restarts: JoinSet<()>,
}

impl EventConsumer {
    pub fn new(
        config: Arc<RebootConfig>,
        executor: Arc<RestartExecutor>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            config,
            executor,
            sink,
            restarts: JoinSet::new(),
        }
    }

    /// Consume `events` until the stream ends or `cancellation_token` fires.
    ///
    /// Restarts still in flight when this returns keep running; await them
    /// with [`EventConsumer::drain`].
    #[tracing::instrument(skip_all)]
    pub async fn run<S>(&mut self, events: S, cancellation_token: CancellationToken)
    where
        S: Stream<Item = PodEvent>,
    {
        info!("Starting pod event consumer");
        let mut events = std::pin::pin!(events);

        loop {
            select! {
                _ = cancellation_token.cancelled() => {
                    info!("Pod event consumer shutdown requested");
                    break;
                }
                event = events.next() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            warn!("Pod event stream ended");
                            break;
                        }
                    }
                }
            }
            self.reap_finished();
        }
    }

    /// Classify one event and act on it.
    pub fn handle_event(&mut self, event: PodEvent) {
        match event {
            PodEvent::Added(pod) => self.sink.emit(Status::PodAdded {
                name: pod.name,
                namespace: pod.namespace,
            }),
            PodEvent::Modified(pod) => {
                if !pod.markers.is_empty() {
                    self.handle_annotated(pod);
                }
            }
            PodEvent::Deleted(pod) => self.sink.emit(Status::PodDeleted {
                name: pod.name,
                namespace: pod.namespace,
            }),
            PodEvent::Unknown { kind } => self.sink.emit(Status::UnknownEvent { kind }),
        }
    }

    fn handle_annotated(&mut self, pod: PodSnapshot) {
        match RebootMarker::classify(&pod.markers, &self.config) {
            RebootMarker::Requested => {
                self.sink.emit(Status::RebootRequested {
                    name: pod.name.clone(),
                    namespace: pod.namespace.clone(),
                });
                self.dispatch(pod);
            }
            RebootMarker::InProgress => self.sink.emit(Status::RebootInProgress {
                name: pod.name,
                namespace: pod.namespace,
            }),
            RebootMarker::Absent => {}
        }
    }

    fn dispatch(&mut self, pod: PodSnapshot) {
        let executor = self.executor.clone();
        let sink = self.sink.clone();

        self.restarts.spawn(async move {
            for result in executor.restart_owning_deployments(&pod).await {
                if let Err(e) = result {
                    debug!(
                        "Restart for pod {}/{} failed: {e:?}",
                        pod.namespace, pod.name
                    );
                    sink.emit(Status::RestartFailed {
                        name: pod.name.clone(),
                        namespace: pod.namespace.clone(),
                        reason: e.current_context().to_string(),
                    });
                }
            }
        });
    }

    /// Number of restarts still running.
    pub fn in_flight(&self) -> usize {
        self.restarts.len()
    }

    /// Wait for every dispatched restart to finish.
    pub async fn drain(&mut self) {
        while let Some(result) = self.restarts.join_next().await {
            log_join_error(result);
        }
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.restarts.try_join_next() {
            log_join_error(result);
        }
    }
}

fn log_join_error(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Restart task panicked: {e}");
        } else {
            warn!("Restart task was cancelled: {e}");
        }
    }
}
