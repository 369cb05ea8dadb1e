use std::fmt;

/// The only failure string ever shown to a caller of the streaming surface.
pub const GENERIC_FAILURE: &str = "Failed to generate component";

/// Errors raised while talking to the upstream chat API.
///
/// These carry upstream detail and are meant for logs only; callers see a
/// [`GenerationError`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success HTTP status.
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Network or stream I/O failed.
    #[error("upstream transport error: {message}")]
    Transport { message: String },
    /// Response shape was not what a chat-completion endpoint returns.
    #[error("upstream protocol error: {message}")]
    Protocol { message: String },
    /// Client configuration is unusable.
    #[error("upstream config error: {message}")]
    Config { message: String },
}

impl UpstreamError {
    /// Creates a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Operation a [`GenerationError`] was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Modify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => f.write_str("generate"),
            Self::Modify => f.write_str("modify"),
        }
    }
}

/// Errors returned by the generation service.
///
/// `Display` never includes upstream detail; the cause is still reachable via
/// `std::error::Error::source` for logging.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The upstream call failed for any reason (network, status, body shape).
    #[error("Failed to {operation} component")]
    Upstream {
        operation: Operation,
        #[source]
        source: UpstreamError,
    },
    /// Caller input was rejected before any upstream call.
    #[error("{0}")]
    Validation(String),
}

impl GenerationError {
    pub(crate) fn upstream(source: UpstreamError) -> Self {
        Self::Upstream {
            operation: Operation::Generate,
            source,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Re-attributes an upstream failure to `operation`, leaving validation errors untouched.
    pub(crate) fn during(self, operation: Operation) -> Self {
        match self {
            Self::Upstream { source, .. } => Self::Upstream { operation, source },
            other => other,
        }
    }

    /// Returns true when the error came from the upstream API rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn upstream_detail_is_hidden_from_display() {
        let err = GenerationError::upstream(UpstreamError::status(401, "invalid api key sk-123"));
        assert_eq!(err.to_string(), GENERIC_FAILURE);
        let source = err.source().expect("source").to_string();
        assert!(source.contains("sk-123"));
    }

    #[test]
    fn during_modify_rewrites_only_upstream_failures() {
        let err = GenerationError::upstream(UpstreamError::transport("reset")).during(Operation::Modify);
        assert_eq!(err.to_string(), "Failed to modify component");

        let err = GenerationError::validation("prompt must not be empty").during(Operation::Modify);
        assert!(matches!(err, GenerationError::Validation(msg) if msg.contains("prompt")));
    }
}
