//! Error types for food analysis.
//!
//! Every failure an analysis can end in maps to exactly one [`FailureKind`],
//! so callers branch on the kind instead of parsing messages.

use std::fmt;

/// Sub-classification of a failed call to the inference capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCause {
    /// Connection, DNS or TLS failures
    Network,
    /// Rejected credential
    Authentication,
    /// Quota or rate limit exhausted
    RateLimit,
    /// The call did not complete in time
    Timeout,
    /// Unknown model identifier
    ModelNotFound,
    /// Any other upstream failure
    Provider,
}

impl fmt::Display for TransportCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportCause::Network => "network",
            TransportCause::Authentication => "authentication",
            TransportCause::RateLimit => "rate limit",
            TransportCause::Timeout => "timeout",
            TransportCause::ModelNotFound => "model not found",
            TransportCause::Provider => "provider",
        };
        f.write_str(label)
    }
}

/// Fieldless tag of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Precondition,
    Configuration,
    Transport,
    EmptyResponse,
    MalformedResponse,
}

/// The main error type for food analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Neither image nor text was supplied; raised before any network activity
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Required credential or endpoint missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The inference capability call itself failed
    #[error("Transport error ({cause}): {message}")]
    Transport {
        cause: TransportCause,
        message: String,
    },

    /// The capability succeeded but returned no usable text
    #[error("Empty response: the model returned no content")]
    EmptyResponse,

    /// The returned text is not a structurally valid nutrition record
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a transport error with an explicit cause
    pub fn transport(cause: TransportCause, msg: impl Into<String>) -> Self {
        Self::Transport {
            cause,
            message: msg.into(),
        }
    }

    /// Create a network transport error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::transport(TransportCause::Network, msg)
    }

    /// Create an authentication transport error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::transport(TransportCause::Authentication, msg)
    }

    /// Create a rate limit transport error
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::transport(TransportCause::RateLimit, msg)
    }

    /// Create a timeout transport error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::transport(TransportCause::Timeout, msg)
    }

    /// Create a model-not-found transport error
    pub fn model_not_found(msg: impl Into<String>) -> Self {
        Self::transport(TransportCause::ModelNotFound, msg)
    }

    /// Create a generic provider transport error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::transport(TransportCause::Provider, msg)
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// The failure kind, for branching without inspecting payloads
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalysisError::Precondition(_) => FailureKind::Precondition,
            AnalysisError::Configuration(_) => FailureKind::Configuration,
            AnalysisError::Transport { .. } => FailureKind::Transport,
            AnalysisError::EmptyResponse => FailureKind::EmptyResponse,
            AnalysisError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }

    /// The transport cause, if this is a transport error
    pub fn transport_cause(&self) -> Option<TransportCause> {
        match self {
            AnalysisError::Transport { cause, .. } => Some(*cause),
            _ => None,
        }
    }

    /// Whether a caller-driven re-attempt of the same request is sensible.
    ///
    /// Nothing in this workspace retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.transport_cause(),
            Some(TransportCause::Network | TransportCause::Timeout | TransportCause::RateLimit)
        )
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}
