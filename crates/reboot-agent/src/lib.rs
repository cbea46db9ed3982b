pub mod app;
pub mod config;
mod domain;
mod infrastructure;

// Re-export main modules
pub use domain::reconcile;
pub use infrastructure::k8s;
pub use infrastructure::kube_client;
