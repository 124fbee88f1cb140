//! Error and status types for servicenow-connect
//!
//! Configuration errors are fatal at adapter construction. Everything else is
//! recovered into the operation result and never thrown across an
//! asynchronous boundary.

use std::fmt;
use thiserror::Error;

/// Result type alias for connector and adapter operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Errors produced by the connector and adapter
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Configuration validation failed (missing or empty property)
    #[error("configuration error: {0}")]
    Config(String),

    /// The transport primitive could not complete the exchange; no response
    /// was obtained
    #[error("transport error: {0}")]
    Transport(String),

    /// A response was obtained but its status falls outside 200-299. Carries
    /// the raw body for diagnostics.
    #[error("protocol error: status {status}")]
    Protocol { status: u16, body: String },
}

impl ConnectorError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Adapter reachability status inferred from health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStatus {
    /// No health check has completed yet
    Uninitialized,
    /// The instance is reachable and serving HTTP, hibernation included
    Online,
    /// The last health check failed at the transport or protocol level
    Offline,
}

impl fmt::Display for AdapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConnectorError::config("adapter property \"url\" required");
        assert_eq!(
            err.to_string(),
            "configuration error: adapter property \"url\" required"
        );

        let err = ConnectorError::Protocol {
            status: 503,
            body: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "protocol error: status 503");
    }

    #[test]
    fn test_error_predicates() {
        assert!(ConnectorError::config("x").is_config());
        assert!(!ConnectorError::config("x").is_transport());
        assert!(ConnectorError::transport("dns failure").is_transport());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AdapterStatus::Uninitialized.to_string(), "uninitialized");
        assert_eq!(AdapterStatus::Online.to_string(), "online");
        assert_eq!(AdapterStatus::Offline.to_string(), "offline");
    }
}
