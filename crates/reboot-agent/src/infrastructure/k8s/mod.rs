//! Kubernetes integration module.
//!
//! This module adapts the Kubernetes API to the reconciliation core.
//!
//! The main components are:
//! - [`PodWatcher`]: Streams pod added/modified/deleted events and resumes dropped watches
//! - [`KubeResourceAccessor`]: Reads replica sets and reads/replaces deployments
//! - [`KubernetesError`]: Errors surfaced by both, with conflicts told apart

pub mod pod_watcher;
pub mod resources;
pub mod types;

pub use pod_watcher::PodWatcher;
pub use resources::KubeResourceAccessor;
pub use types::KubernetesError;
