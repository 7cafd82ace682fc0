use std::sync::Arc;

use crate::{
    config, error,
    error::Result,
    info,
    management::TokenManager,
    spotify::{self, SpotifyTokenEndpoint},
    success,
    types::Token,
};

pub type Session = Arc<TokenManager<SpotifyTokenEndpoint>>;

pub async fn auth() {
    let endpoint = match SpotifyTokenEndpoint::from_config() {
        Ok(endpoint) => endpoint,
        Err(e) => error!("{}", e),
    };

    let token = match spotify::auth::sign_in(&endpoint).await {
        Ok(token) => token,
        Err(e) => error!("Sign-in failed: {}", e),
    };

    success!("Authentication successful!");
    info!(
        "Add this line to your .env to skip the browser next time:\nSPOTIFY_REFRESH_TOKEN={}",
        token.refresh_token
    );
}

/// Establishes the session's token, from configuration or by signing in.
///
/// The token is validated before returning so a revoked refresh token is
/// reported here rather than in the middle of a listing.
pub async fn session() -> Result<Session> {
    let endpoint = SpotifyTokenEndpoint::from_config()?;

    let token = match config::spotify_refresh_token() {
        Some(refresh_token) => Token::from_refresh_token(refresh_token),
        None => {
            info!("Opening the browser to sign in to Spotify...");
            spotify::auth::sign_in(&endpoint).await?
        }
    };

    let tokens = Arc::new(TokenManager::with_token(endpoint, token));
    tokens.access_token().await?;
    Ok(tokens)
}
