//! Human-readable status lines describing every reconciliation outcome.

use std::time::Duration;

use tracing::error;
use tracing::info;
use tracing::warn;

use super::types::DeploymentTarget;

/// One observable outcome of the controller.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum Status {
    #[display("Pod {namespace}/{name} added")]
    PodAdded { name: String, namespace: String },
    #[display("Pod {namespace}/{name} deleted")]
    PodDeleted { name: String, namespace: String },
    #[display("Ignoring pod event of unrecognized kind {kind}")]
    UnknownEvent { kind: String },
    #[display("Pod {namespace}/{name} has a reboot in progress")]
    RebootInProgress { name: String, namespace: String },
    #[display("Pod {namespace}/{name} requested a reboot")]
    RebootRequested { name: String, namespace: String },
    #[display("Pod {namespace}/{name} is not owned by a deployment, nothing to restart")]
    NoOwningDeployment { name: String, namespace: String },
    /// `backoff` is the wait before the next attempt. It is not slept when
    /// `retrying` is false.
    #[display(
        "Conflict restarting deployment {deployment} on attempt {attempt}, {}",
        next_step(*backoff, *retrying)
    )]
    ConflictRetry {
        deployment: DeploymentTarget,
        attempt: u32,
        backoff: Duration,
        retrying: bool,
    },
    #[display("Restarted deployment {deployment} on attempt {attempt}")]
    RestartSucceeded {
        deployment: DeploymentTarget,
        attempt: u32,
    },
    #[display("Gave up restarting deployment {deployment} after {attempts} conflicting attempts")]
    RetriesExhausted {
        deployment: DeploymentTarget,
        attempts: u32,
    },
    #[display("Failed to restart deployments owning pod {namespace}/{name}: {reason}")]
    RestartFailed {
        name: String,
        namespace: String,
        reason: String,
    },
}

fn next_step(backoff: Duration, retrying: bool) -> String {
    if retrying {
        format!("retrying in {backoff:?}")
    } else {
        "no attempts left".to_string()
    }
}

/// Destination for status lines. Delivery is best-effort.
pub trait StatusSink: Send + Sync {
    fn emit(&self, status: Status);
}

/// Writes status lines through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn emit(&self, status: Status) {
        match status {
            Status::ConflictRetry { .. } | Status::RetriesExhausted { .. } => warn!("{status}"),
            Status::RestartFailed { .. } => error!("{status}"),
            _ => info!("{status}"),
        }
    }
}
