//! The typed error taxonomy every request failure is reduced to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when a failure carries no usable detail of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Stable machine-readable code, one per error kind.
///
/// The string forms are part of the wire contract: backends emit them in
/// error envelopes and clients match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    #[serde(rename = "AUTHORIZATION_ERROR")]
    Authorization,
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[serde(rename = "INTEGRATION_ERROR")]
    Integration,
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorCode {
    /// The wire form of this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "AUTH_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Integration => "INTEGRATION_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Parse a wire code. Returns `None` for anything outside the taxonomy.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "AUTH_ERROR" => Some(Self::Auth),
            "AUTHORIZATION_ERROR" => Some(Self::Authorization),
            "VALIDATION_ERROR" => Some(Self::Validation),
            "NETWORK_ERROR" => Some(Self::Network),
            "INTEGRATION_ERROR" => Some(Self::Integration),
            "UNKNOWN_ERROR" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully classified failure.
///
/// Every raw error in the layer (transport failures, backend envelopes,
/// plain strings) is normalized into exactly one of these variants, so
/// callers can match on the kind without inspecting messages.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "code")]
pub enum TypedError {
    /// Missing or expired credentials (401 equivalent)
    #[error("Authentication failed: {message}")]
    #[serde(rename = "AUTH_ERROR")]
    Auth {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },

    /// Authenticated but not allowed (403 equivalent)
    #[error("Not authorized: {message}")]
    #[serde(rename = "AUTHORIZATION_ERROR")]
    Authorization {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },

    /// Rejected input (400 equivalent)
    #[error("Validation failed: {message}")]
    #[serde(rename = "VALIDATION_ERROR")]
    Validation {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },

    /// Transport-level failure: timeout, refused connection, DNS (503 equivalent)
    #[error("Network error: {message}")]
    #[serde(rename = "NETWORK_ERROR")]
    Network {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },

    /// A downstream system failed while handling the request (502 equivalent)
    #[error("Integration error from {provider}: {message}")]
    #[serde(rename = "INTEGRATION_ERROR")]
    Integration {
        provider: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },

    /// Anything that fits no other bucket
    #[error("{message}")]
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
}

impl TypedError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into(), hint: None }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization { message: message.into(), hint: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), hint: None }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into(), hint: None }
    }

    pub fn integration(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Integration { provider: provider.into(), message: message.into(), hint: None }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown { message: message.into(), hint: None }
    }

    /// Attach a recovery hint, replacing any existing one.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let slot = match &mut self {
            Self::Auth { hint, .. }
            | Self::Authorization { hint, .. }
            | Self::Validation { hint, .. }
            | Self::Network { hint, .. }
            | Self::Integration { hint, .. }
            | Self::Unknown { hint, .. } => hint,
        };
        *slot = Some(hint.into());
        self
    }

    /// The machine-readable code for this error.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Auth { .. } => ErrorCode::Auth,
            Self::Authorization { .. } => ErrorCode::Authorization,
            Self::Validation { .. } => ErrorCode::Validation,
            Self::Network { .. } => ErrorCode::Network,
            Self::Integration { .. } => ErrorCode::Integration,
            Self::Unknown { .. } => ErrorCode::Unknown,
        }
    }

    /// Get HTTP status code for this error.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Auth { .. } => 401,
            Self::Authorization { .. } => 403,
            Self::Validation { .. } => 400,
            Self::Network { .. } => 503,
            Self::Integration { .. } => 502,
            Self::Unknown { .. } => 500,
        }
    }

    /// The raw diagnostic message.
    pub fn message(&self) -> &str {
        match self {
            Self::Auth { message, .. }
            | Self::Authorization { message, .. }
            | Self::Validation { message, .. }
            | Self::Network { message, .. }
            | Self::Integration { message, .. }
            | Self::Unknown { message, .. } => message,
        }
    }

    /// Recovery hint supplied by the failing system, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Auth { hint, .. }
            | Self::Authorization { hint, .. }
            | Self::Validation { hint, .. }
            | Self::Network { hint, .. }
            | Self::Integration { hint, .. }
            | Self::Unknown { hint, .. } => hint.as_deref(),
        }
    }

    /// The failing downstream system, for integration errors.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Integration { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// A message suitable for end users. Known kinds map to fixed copy;
    /// unknown failures fall back to their own message.
    pub fn friendly_message(&self) -> String {
        match self {
            Self::Auth { .. } => "Your session has expired. Please sign in again.".to_string(),
            Self::Authorization { .. } => {
                "You don't have permission to perform this action.".to_string()
            }
            Self::Validation { .. } => {
                "Some of the provided information is invalid. Please review and try again."
                    .to_string()
            }
            Self::Network { .. } => {
                "We're having trouble reaching the server. Please check your connection and try again."
                    .to_string()
            }
            Self::Integration { .. } => {
                "A connected service is temporarily unavailable. Please try again shortly."
                    .to_string()
            }
            Self::Unknown { message, .. } => message.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = TypedError::integration("hermes", "upstream returned garbage")
            .with_hint("check the provider dashboard");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("INTEGRATION_ERROR"));
        assert!(json.contains("hermes"));
        assert!(json.contains("check the provider dashboard"));

        let deserialized: TypedError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_serialized_code_matches_accessor() {
        let cases = vec![
            TypedError::auth("a"),
            TypedError::authorization("b"),
            TypedError::validation("c"),
            TypedError::network("d"),
            TypedError::integration("p", "e"),
            TypedError::unknown("f"),
        ];

        for err in cases {
            let json = serde_json::to_value(&err).unwrap();
            assert_eq!(json["code"], err.code().as_str());
        }
    }

    #[test]
    fn test_hint_omitted_when_absent() {
        let json = serde_json::to_string(&TypedError::auth("expired")).unwrap();
        assert!(!json.contains("hint"));
    }

    #[test]
    fn test_http_status() {
        assert_eq!(TypedError::auth("x").http_status(), 401);
        assert_eq!(TypedError::authorization("x").http_status(), 403);
        assert_eq!(TypedError::validation("x").http_status(), 400);
        assert_eq!(TypedError::network("x").http_status(), 503);
        assert_eq!(TypedError::integration("p", "x").http_status(), 502);
        assert_eq!(TypedError::unknown("x").http_status(), 500);
    }

    #[test]
    fn test_friendly_message_falls_back_for_unknown() {
        let err = TypedError::unknown("the flux capacitor desynchronized");
        assert_eq!(err.friendly_message(), "the flux capacitor desynchronized");

        let err = TypedError::network("connect ECONNREFUSED");
        assert!(!err.friendly_message().contains("ECONNREFUSED"));
    }

    #[test]
    fn test_code_parse_round_trip() {
        for code in [
            ErrorCode::Auth,
            ErrorCode::Authorization,
            ErrorCode::Validation,
            ErrorCode::Network,
            ErrorCode::Integration,
            ErrorCode::Unknown,
        ] {
            assert_eq!(ErrorCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(ErrorCode::parse("RATE_LIMIT_ERROR"), None);
    }

    #[test]
    fn test_error_display() {
        let err = TypedError::integration("finance-api", "ledger sync failed");
        let msg = format!("{}", err);
        assert!(msg.contains("finance-api"));
        assert!(msg.contains("ledger sync failed"));
    }
}
