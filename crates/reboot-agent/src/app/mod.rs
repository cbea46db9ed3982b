//! Application module
//!
//! Wires the Kubernetes adapters to the reconciliation core and manages the
//! daemon lifecycle.

pub mod core;
pub mod tasks;

pub use self::core::Application;
