//! Wire envelopes exchanged with backend functions.

use crate::error::GENERIC_ERROR_MESSAGE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a backend-supplied failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    /// Taxonomy code, when the backend knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Downstream system that failed, for integration errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Recovery hint for the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Successful function response: `{ data, error? }`.
///
/// A missing `data` member decodes as JSON null; a present `error` member
/// marks the call failed even under a 2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionEnvelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Failed function response: `{ error }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    /// Fallback envelope for responses with a missing or unreadable body.
    pub fn generic() -> Self {
        Self {
            error: ErrorBody {
                message: GENERIC_ERROR_MESSAGE.to_string(),
                code: Some("UNKNOWN_ERROR".to_string()),
                provider: None,
                hint: None,
            },
        }
    }
}
