use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    error::{AuthError, Result},
    types::{Token, TokenFault, TokenResponse},
    utils,
};

/// Exchanges a refresh token for a new access token at the identity provider.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// Owns the session's token pair.
///
/// The token lives in memory for the lifetime of the manager only. The lock is
/// held across the provider call, so callers arriving while a refresh is in
/// flight wait for it and then see the refreshed token instead of starting a
/// second exchange.
pub struct TokenManager<E> {
    token: Mutex<Option<Token>>,
    exchange: E,
}

impl<E: TokenExchange> TokenManager<E> {
    pub fn new(exchange: E) -> Self {
        TokenManager {
            token: Mutex::new(None),
            exchange,
        }
    }

    pub fn with_token(exchange: E, token: Token) -> Self {
        TokenManager {
            token: Mutex::new(Some(token)),
            exchange,
        }
    }

    pub async fn sign_in(&self, token: Token) {
        *self.token.lock().await = Some(token);
    }

    pub async fn sign_out(&self) {
        self.token.lock().await.take();
    }

    pub async fn current_token(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    /// Returns the held token, refreshing it first when it has expired.
    ///
    /// A failed refresh does not raise: the token comes back with
    /// `last_error` set and callers must send the user to sign-in. A token
    /// that is already flagged is never refreshed again.
    pub async fn get_valid_token(&self) -> std::result::Result<Token, AuthError> {
        let mut guard = self.token.lock().await;
        let Some(token) = guard.as_mut() else {
            return Err(AuthError::SignInRequired);
        };

        if !token.is_expired_at(utils::now_ms()) || token.last_error.is_some() {
            return Ok(token.clone());
        }

        debug!("access token expired, refreshing");
        match self.exchange.refresh(&token.refresh_token).await {
            Ok(response) => {
                token.apply_refresh(response, utils::now_ms());
                debug!(expires_at_ms = token.expires_at_ms, "access token refreshed");
            }
            Err(e) => {
                warn!(error = %e, "access token refresh failed");
                token.last_error = Some(TokenFault::RefreshFailed);
            }
        }

        Ok(token.clone())
    }

    /// Bearer string for the next request, or the reason there is none.
    pub async fn access_token(&self) -> Result<String> {
        let token = self.get_valid_token().await?;
        if token.last_error.is_some() {
            return Err(AuthError::RefreshFailed.into());
        }
        Ok(token.access_token)
    }
}
