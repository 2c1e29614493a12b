use shared::domain::BackendKind;
use thiserror::Error;

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response: connection refused, DNS, timeout.
    #[error("backend unreachable at {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx status or a body that does not match the expected shape.
    #[error("unexpected response from {endpoint}: {detail}")]
    UnexpectedResponse { endpoint: String, detail: String },
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: BackendKind,
        operation: &'static str,
    },
    #[error("{what} not found")]
    NotFound { what: String },
    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn unexpected(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }

    pub fn unsupported(backend: BackendKind, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    /// True when the engine could not be reached at all, as opposed to
    /// answering with something we did not expect.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
