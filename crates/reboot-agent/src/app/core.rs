use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::app::tasks;
use crate::config::DaemonArgs;
use crate::config::RebootConfig;
use crate::infrastructure::k8s::KubeResourceAccessor;
use crate::infrastructure::k8s::PodWatcher;
use crate::infrastructure::kube_client;
use crate::reconcile::EventConsumer;
use crate::reconcile::RestartExecutor;
use crate::reconcile::StatusSink;
use crate::reconcile::SystemClock;
use crate::reconcile::TracingStatusSink;

/// How long in-flight restarts may take to finish after shutdown starts.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application core structure with explicit dependencies
pub struct Application {
    daemon_args: DaemonArgs,
    config: Arc<RebootConfig>,
}

impl Application {
    pub fn new(daemon_args: DaemonArgs, config: RebootConfig) -> Self {
        Self {
            daemon_args,
            config: Arc::new(config),
        }
    }

    /// Watch pods until a shutdown signal arrives, then wait for in-flight restarts.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting reboot agent...");

        let client = kube_client::init_kube_client(self.daemon_args.kubeconfig.clone())
            .await
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;

        let sink: Arc<dyn StatusSink> = Arc::new(TracingStatusSink);
        let executor = Arc::new(RestartExecutor::new(
            Arc::new(KubeResourceAccessor::new(client.clone())),
            sink.clone(),
            Arc::new(SystemClock),
            self.config.clone(),
        ));
        let watcher = PodWatcher::new(client, self.daemon_args.namespace.clone());
        let mut consumer = EventConsumer::new(self.config.clone(), executor, sink);

        let cancellation_token = CancellationToken::new();
        let signal_handler = tasks::spawn_signal_handler(cancellation_token.clone())?;

        consumer.run(watcher.events(), cancellation_token).await;
        signal_handler.abort();

        tasks::drain_with_timeout(&mut consumer, SHUTDOWN_TIMEOUT).await;

        tracing::info!("Reboot agent stopped");
        Ok(())
    }
}
