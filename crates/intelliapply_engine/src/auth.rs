use std::time::Duration;

use intelliapply_logging::{ia_debug, ia_warn};

use crate::ApiError;

/// Source of bearer tokens for backend requests.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, or `Ok(None)` while no session exists yet.
    async fn access_token(&self) -> Result<Option<String>, ApiError>;

    /// Renews the session after the backend rejected a token.
    ///
    /// Returns the replacement token, or `None` when the session cannot be
    /// renewed and the user has to sign in again.
    async fn refresh_session(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// A fixed token taken from configuration. Cannot be renewed.
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
        Self { token }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_present(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.token.clone())
    }
}

/// Asks the provider for a token up to `attempts` times, `delay` apart.
///
/// A session can show up shortly after sign-in, so an empty answer is retried.
/// A provider error ends the attempts. `None` means the request goes out
/// unauthenticated.
pub(crate) async fn acquire_token(
    provider: &dyn TokenProvider,
    attempts: u32,
    delay: Duration,
) -> Option<String> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        match provider.access_token().await {
            Ok(Some(token)) => return Some(token),
            Ok(None) => {
                ia_debug!("No session on token attempt {}/{}", attempt, attempts);
            }
            Err(err) => {
                ia_warn!("Token provider failed on attempt {}: {}", attempt, err);
                return None;
            }
        }
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }
    ia_debug!("Proceeding without a bearer token");
    None
}
