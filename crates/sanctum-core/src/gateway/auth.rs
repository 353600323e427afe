//! Bearer credential seam.
//!
//! The gateway consults a [`TokenProvider`] before every attempt, so a
//! token refreshed mid-retry is picked up by the next attempt.

use async_trait::async_trait;

/// Supplies the current bearer credential, if any.
///
/// Absence is not an error: the gateway sends the request unauthenticated
/// and lets the backend decide whether that is acceptable.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed-token provider for wired-up sessions and tests.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Provider for anonymous sessions; never yields a credential.
pub struct AnonymousTokens;

#[async_trait]
impl TokenProvider for AnonymousTokens {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_yields_token() {
        let provider = StaticTokenProvider::new("tok-123");
        assert_eq!(provider.bearer_token().await.as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_anonymous_provider_yields_nothing() {
        assert!(AnonymousTokens.bearer_token().await.is_none());
    }
}
