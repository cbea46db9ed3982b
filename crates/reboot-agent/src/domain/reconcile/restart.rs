use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::SecondsFormat;
use error_stack::Report;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use super::resolver::OwnerResolver;
use super::status::Status;
use super::status::StatusSink;
use super::traits::Clock;
use super::traits::ResourceAccessor;
use super::types::DeploymentTarget;
use super::types::PodSnapshot;
use super::types::REPLICA_SET_KIND;
use crate::config::RebootConfig;
use crate::infrastructure::k8s::KubernetesError;

/// How a restart of one deployment ended, short of a hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The replace went through on `attempt`.
    Succeeded { attempt: u32 },
    /// Every allowed attempt hit a conflict.
    Exhausted { attempts: u32 },
}

/// Retry bookkeeping of a single restart. Both fields only grow.
#[derive(Debug)]
struct RestartAttempt {
    attempt: u32,
    backoff: Duration,
}

impl RestartAttempt {
    const fn new(initial_backoff: Duration) -> Self {
        Self {
            attempt: 1,
            backoff: initial_backoff,
        }
    }

    fn advance(&mut self, increment: Duration) {
        self.attempt += 1;
        self.backoff += increment;
    }
}

/// Resolves the deployments owning a pod and forces them to roll.
pub struct RestartExecutor {
    accessor: Arc<dyn ResourceAccessor>,
    resolver: OwnerResolver,
    sink: Arc<dyn StatusSink>,
    clock: Arc<dyn Clock>,
    config: Arc<RebootConfig>,
}

impl RestartExecutor {
    pub fn new(
        accessor: Arc<dyn ResourceAccessor>,
        sink: Arc<dyn StatusSink>,
        clock: Arc<dyn Clock>,
        config: Arc<RebootConfig>,
    ) -> Self {
        Self {
            resolver: OwnerResolver::new(accessor.clone()),
            accessor,
            sink,
            clock,
            config,
        }
    }

    /// Restart every deployment reachable through the pod's replica set owners.
    ///
    /// Targets are restarted one after another in encounter order, each with
    /// its own retry state. A failed replica set lookup or a failed restart
    /// ends only that branch; the remaining targets are still attempted. The
    /// result holds one entry per target, plus one per replica set that could
    /// not be fetched. A pod without such an owner chain yields no entries.
    #[tracing::instrument(skip(self, pod), fields(pod = %pod.name, namespace = %pod.namespace))]
    pub async fn restart_owning_deployments(
        &self,
        pod: &PodSnapshot,
    ) -> Vec<Result<RestartOutcome, Report<KubernetesError>>> {
        let mut results = Vec::new();

        for replica_set in pod.owners_of_kind(REPLICA_SET_KIND) {
            let targets = match self
                .resolver
                .deployments_owning(replica_set, &pod.namespace)
                .await
            {
                Ok(targets) => targets,
                Err(report) => {
                    results.push(Err(report.attach_printable(format!(
                        "resolving replica set {} owning pod {}/{}",
                        replica_set.name, pod.namespace, pod.name
                    ))));
                    continue;
                }
            };

            for target in targets {
                results.push(self.restart(&target).await);
            }
        }

        if results.is_empty() {
            self.sink.emit(Status::NoOwningDeployment {
                name: pod.name.clone(),
                namespace: pod.namespace.clone(),
            });
        }

        results
    }

    /// Stamp the restart annotation onto `target`'s pod template.
    ///
    /// Conflicting replaces are retried after a growing backoff until
    /// `max_attempts` is reached, which ends the restart as
    /// [`RestartOutcome::Exhausted`].
    ///
    /// # Errors
    ///
    /// - any non-conflict failure of the fetch or the replace, without retry
    #[tracing::instrument(skip_all, fields(deployment = %target))]
    pub async fn restart(
        &self,
        target: &DeploymentTarget,
    ) -> Result<RestartOutcome, Report<KubernetesError>> {
        let mut state = RestartAttempt::new(self.config.initial_backoff);

        loop {
            match self.stamp_and_replace(target).await {
                Ok(()) => {
                    self.sink.emit(Status::RestartSucceeded {
                        deployment: target.clone(),
                        attempt: state.attempt,
                    });
                    return Ok(RestartOutcome::Succeeded {
                        attempt: state.attempt,
                    });
                }
                Err(report) if report.current_context().is_conflict() => {
                    let retrying = state.attempt < self.config.max_attempts;
                    self.sink.emit(Status::ConflictRetry {
                        deployment: target.clone(),
                        attempt: state.attempt,
                        backoff: state.backoff,
                        retrying,
                    });

                    if !retrying {
                        self.sink.emit(Status::RetriesExhausted {
                            deployment: target.clone(),
                            attempts: state.attempt,
                        });
                        return Ok(RestartOutcome::Exhausted {
                            attempts: state.attempt,
                        });
                    }

                    debug!("Retrying after {:?}: {report:?}", state.backoff);
                    tokio::time::sleep(state.backoff).await;
                    state.advance(self.config.backoff_increment);
                }
                Err(report) => return Err(report),
            }
        }
    }

    /// One fetch-mutate-replace round against the latest stored version.
    ///
    /// `restartedAt` has millisecond precision. Two requests for the same
    /// deployment within one millisecond write the same value, so the second
    /// replace leaves the template unchanged and starts no further rollout;
    /// the deployment has still been restarted at least once for both.
    async fn stamp_and_replace(
        &self,
        target: &DeploymentTarget,
    ) -> Result<(), Report<KubernetesError>> {
        let mut deployment = self
            .accessor
            .get_deployment(&target.name, &target.namespace)
            .await?;

        let restarted_at = self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let annotations = template_annotations_mut(&mut deployment).ok_or_else(|| {
            Report::new(KubernetesError::InvalidResource {
                kind: "Deployment",
                name: target.name.clone(),
                namespace: target.namespace.clone(),
                message: "deployment has no spec".to_string(),
            })
        })?;
        annotations.insert(self.config.restarted_at_key.clone(), restarted_at);

        self.accessor.replace_deployment(&deployment).await?;
        Ok(())
    }
}

/// Pod-template annotations of a deployment, created empty when absent.
fn template_annotations_mut(deployment: &mut Deployment) -> Option<&mut BTreeMap<String, String>> {
    let template = &mut deployment.spec.as_mut()?.template;
    Some(
        template
            .metadata
            .get_or_insert_with(ObjectMeta::default)
            .annotations
            .get_or_insert_with(BTreeMap::new),
    )
}
