//! Event bridge errors.

use thiserror::Error;

/// Errors that can occur while persisting or reading the event log.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The backing store could not be read or written
    #[error("Event store error: {0}")]
    Storage(String),

    /// An event could not be encoded or decoded
    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_display() {
        let err = BridgeError::Storage("disk full".to_string());
        assert!(format!("{}", err).contains("disk full"));
    }
}
