//! Error types for ouroboros

use thiserror::Error;

/// Result type alias for ouroboros operations
pub type Result<T> = std::result::Result<T, DataBridgeError>;

/// Unified error type for all ouroboros operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataBridgeError {
    /// Invalid builder or model setup detected at call time (bad key metadata,
    /// unknown binding bucket, unresolvable composite key).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A collection mutation was given a value that is not a map, set or list.
    #[error("Invalid binding type: {0}")]
    InvalidBindingType(String),

    /// Operation that cannot be expressed against a wide-column store.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// A "fail if absent" lookup found no row.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Errors raised by a transport implementation. The query layer never
    // produces these itself, it only passes them through.

    /// Statement rejected by the store or a driver-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Coordinator or client-side timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Not enough replicas available for the requested consistency
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl DataBridgeError {
    /// Returns true if the error was raised by the builder before any statement was sent.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DataBridgeError::Configuration(_)
                | DataBridgeError::InvalidBindingType(_)
                | DataBridgeError::NotImplemented(_)
        )
    }

    /// Returns true if the error originated at the transport boundary.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DataBridgeError::Transport(_)
                | DataBridgeError::Timeout(_)
                | DataBridgeError::Unavailable(_)
        )
    }
}

impl From<serde_json::Error> for DataBridgeError {
    fn from(err: serde_json::Error) -> Self {
        DataBridgeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_configuration() {
        let err = DataBridgeError::Configuration("Primary key not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: Primary key not set");
    }

    #[test]
    fn test_error_display_invalid_binding_type() {
        let err = DataBridgeError::InvalidBindingType("int".to_string());
        assert_eq!(err.to_string(), "Invalid binding type: int");
    }

    #[test]
    fn test_error_display_not_implemented() {
        let err = DataBridgeError::NotImplemented("whereKeyNot".to_string());
        assert_eq!(err.to_string(), "Not implemented: whereKeyNot");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = DataBridgeError::NotFound("users".to_string());
        assert_eq!(err.to_string(), "Not found: users");
    }

    #[test]
    fn test_error_display_query() {
        let err = DataBridgeError::Query("invalid operator".to_string());
        assert_eq!(err.to_string(), "Query error: invalid operator");
    }

    #[test]
    fn test_error_display_transport() {
        let err = DataBridgeError::Transport("no hosts available".to_string());
        assert_eq!(err.to_string(), "Transport error: no hosts available");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: DataBridgeError = json_err.into();
        assert!(matches!(err, DataBridgeError::Serialization(_)));
    }

    #[test]
    fn test_is_configuration() {
        assert!(DataBridgeError::Configuration("test".to_string()).is_configuration());
        assert!(DataBridgeError::InvalidBindingType("test".to_string()).is_configuration());
        assert!(DataBridgeError::NotImplemented("test".to_string()).is_configuration());
        assert!(!DataBridgeError::Query("test".to_string()).is_configuration());
        assert!(!DataBridgeError::Transport("test".to_string()).is_configuration());
    }

    #[test]
    fn test_is_transport() {
        assert!(DataBridgeError::Transport("test".to_string()).is_transport());
        assert!(DataBridgeError::Timeout("test".to_string()).is_transport());
        assert!(DataBridgeError::Unavailable("test".to_string()).is_transport());
        assert!(!DataBridgeError::NotFound("test".to_string()).is_transport());
    }
}
