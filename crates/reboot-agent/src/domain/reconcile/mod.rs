//! Reconciliation core.
//!
//! Pod events flow one way through three stages:
//! - [`EventConsumer`]: reads the event stream and dispatches reboot requests
//! - [`RebootMarker`]: decides what a modified pod's annotations ask for
//! - [`RestartExecutor`]: resolves pod -> replica set -> deployment and stamps
//!   the restart annotation with a bounded, backing-off retry on conflicts

pub mod annotations;
pub mod consumer;
#[cfg(test)]
pub(crate) mod mock;
pub mod resolver;
pub mod restart;
pub mod status;
pub mod traits;
pub mod types;

pub use annotations::RebootMarker;
pub use consumer::EventConsumer;
pub use resolver::OwnerResolver;
pub use restart::RestartExecutor;
pub use restart::RestartOutcome;
pub use status::Status;
pub use status::StatusSink;
pub use status::TracingStatusSink;
pub use traits::Clock;
pub use traits::ResourceAccessor;
pub use traits::SystemClock;
pub use types::DeploymentTarget;
pub use types::OwnerRef;
pub use types::PodEvent;
pub use types::PodSnapshot;
