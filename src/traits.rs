//! Traits and interfaces for pluggable authentication

use async_trait::async_trait;

/// Source of the bearer token attached to authenticated requests.
///
/// Implementations wrap whatever identity provider the application uses.
/// Returning `None` is not an error: the request is sent without an
/// `Authorization` header and the backend decides whether to reject it.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get the current token
    ///
    /// # Returns
    /// * `Option<String>` - The token, or `None` when no user is signed in
    async fn token(&self) -> Option<String>;
}

/// Token provider backed by a fixed token, e.g. one read from `CAS_API_TOKEN`.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}
