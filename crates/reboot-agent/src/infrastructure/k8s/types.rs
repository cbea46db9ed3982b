use core::error::Error;

/// HTTP status the API server answers with on a stale `resourceVersion`.
const STATUS_CONFLICT: u16 = 409;
const STATUS_NOT_FOUND: u16 = 404;

/// Errors that can occur during Kubernetes operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum KubernetesError {
    #[display("Failed to connect to Kubernetes API: {message}")]
    ConnectionFailed { message: String },
    #[display("Failed to watch pods: {message}")]
    WatchFailed { message: String },
    #[display("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        name: String,
        namespace: String,
    },
    #[display("{kind} {namespace}/{name} was modified concurrently")]
    Conflict {
        kind: &'static str,
        name: String,
        namespace: String,
    },
    #[display("{kind} {namespace}/{name} is malformed: {message}")]
    InvalidResource {
        kind: &'static str,
        name: String,
        namespace: String,
        message: String,
    },
    #[display("Request for {kind} {namespace}/{name} failed: {message}")]
    RequestFailed {
        kind: &'static str,
        name: String,
        namespace: String,
        message: String,
    },
}

impl Error for KubernetesError {}

impl KubernetesError {
    /// Classify a kube API error for the resource `kind` `namespace/name`.
    pub fn from_api_error(
        err: &kube::Error,
        kind: &'static str,
        name: &str,
        namespace: &str,
    ) -> Self {
        let (name, namespace) = (name.to_string(), namespace.to_string());
        match err {
            kube::Error::Api(response) if response.code == STATUS_CONFLICT => Self::Conflict {
                kind,
                name,
                namespace,
            },
            kube::Error::Api(response) if response.code == STATUS_NOT_FOUND => Self::NotFound {
                kind,
                name,
                namespace,
            },
            other => Self::RequestFailed {
                kind,
                name,
                namespace,
                message: other.to_string(),
            },
        }
    }

    /// Whether the write lost an optimistic-concurrency race and may be retried.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
