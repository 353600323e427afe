//! Total normalization of raw failures into the typed taxonomy.
//!
//! `classify` and `classify_value` never fail: whatever shape a failure
//! arrives in, it leaves as exactly one [`TypedError`].

use sanctum_types::models::{ErrorBody, ErrorEnvelope};
use sanctum_types::{ErrorCode, TypedError, GENERIC_ERROR_MESSAGE};
use serde_json::Value;

/// Reduce any raw error to a `TypedError`.
///
/// Already-typed errors pass through unchanged, transport failures map to
/// `NETWORK_ERROR` (except a body that fails to decode, which is a
/// permanent `UNKNOWN_ERROR`), and everything else becomes
/// `UNKNOWN_ERROR` carrying the original message.
pub fn classify(raw: &anyhow::Error) -> TypedError {
    if let Some(typed) = raw.downcast_ref::<TypedError>() {
        return typed.clone();
    }
    if let Some(transport) = raw.downcast_ref::<reqwest::Error>() {
        return classify_transport(transport);
    }
    TypedError::unknown(raw.to_string())
}

fn classify_transport(error: &reqwest::Error) -> TypedError {
    if error.is_timeout() {
        TypedError::network(format!("request timeout: {}", error))
    } else if error.is_connect() {
        TypedError::network(format!("connection failed: {}", error))
    } else if error.is_decode() {
        TypedError::unknown(format!("invalid response body: {}", error))
    } else {
        TypedError::network(format!("transport error: {}", error))
    }
}

/// Reduce an error-shaped JSON value of unknown provenance to a
/// `TypedError`.
///
/// Understands both the bare error body and the `{ "error": ... }`
/// envelope. Values with no usable content collapse to a generic
/// `UNKNOWN_ERROR`.
pub fn classify_value(raw: &Value) -> TypedError {
    if let Ok(envelope) = serde_json::from_value::<ErrorEnvelope>(raw.clone()) {
        return from_wire(envelope.error);
    }
    if let Ok(body) = serde_json::from_value::<ErrorBody>(raw.clone()) {
        return from_wire(body);
    }
    match raw {
        Value::String(message) if !message.is_empty() => TypedError::unknown(message.clone()),
        _ => TypedError::unknown(GENERIC_ERROR_MESSAGE),
    }
}

/// Rebuild a typed error from its wire form, honoring a known `code` and
/// defaulting to `UNKNOWN_ERROR` otherwise.
pub fn from_wire(body: ErrorBody) -> TypedError {
    let ErrorBody { message, code, provider, hint } = body;
    let typed = match code.as_deref().and_then(ErrorCode::parse) {
        Some(ErrorCode::Auth) => TypedError::auth(message),
        Some(ErrorCode::Authorization) => TypedError::authorization(message),
        Some(ErrorCode::Validation) => TypedError::validation(message),
        Some(ErrorCode::Network) => TypedError::network(message),
        Some(ErrorCode::Integration) => {
            TypedError::integration(provider.unwrap_or_else(|| "upstream".to_string()), message)
        }
        Some(ErrorCode::Unknown) | None => TypedError::unknown(message),
    };
    match hint {
        Some(hint) => typed.with_hint(hint),
        None => typed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_error_passes_through() {
        let original = TypedError::authorization("saints only");
        let raw = anyhow::Error::new(original.clone());
        assert_eq!(classify(&raw), original);
    }

    #[test]
    fn test_plain_error_becomes_unknown() {
        let raw = anyhow::anyhow!("something odd happened");
        let typed = classify(&raw);
        assert_eq!(typed.code(), ErrorCode::Unknown);
        assert_eq!(typed.message(), "something odd happened");
    }

    #[test]
    fn test_value_with_known_code() {
        let raw = serde_json::json!({
            "error": {
                "message": "token expired",
                "code": "AUTH_ERROR",
                "hint": "sign in again",
            }
        });

        let typed = classify_value(&raw);
        assert_eq!(typed.code(), ErrorCode::Auth);
        assert_eq!(typed.message(), "token expired");
        assert_eq!(typed.hint(), Some("sign in again"));
    }

    #[test]
    fn test_value_bare_body_with_provider() {
        let raw = serde_json::json!({
            "message": "ledger sync failed",
            "code": "INTEGRATION_ERROR",
            "provider": "finance-api",
        });

        let typed = classify_value(&raw);
        assert_eq!(typed.code(), ErrorCode::Integration);
        assert_eq!(typed.provider(), Some("finance-api"));
    }

    #[test]
    fn test_value_with_foreign_code() {
        let raw = serde_json::json!({ "message": "rate limited", "code": "RATE_LIMIT" });
        let typed = classify_value(&raw);
        assert_eq!(typed.code(), ErrorCode::Unknown);
        assert_eq!(typed.message(), "rate limited");
    }

    #[test]
    fn test_value_totality() {
        assert_eq!(classify_value(&serde_json::json!(null)).code(), ErrorCode::Unknown);
        assert_eq!(classify_value(&serde_json::json!(42)).code(), ErrorCode::Unknown);
        assert_eq!(classify_value(&serde_json::json!({"weird": true})).code(), ErrorCode::Unknown);
        assert_eq!(classify_value(&serde_json::json!("")).message(), GENERIC_ERROR_MESSAGE);

        let from_string = classify_value(&serde_json::json!("plain failure text"));
        assert_eq!(from_string.message(), "plain failure text");
    }
}
