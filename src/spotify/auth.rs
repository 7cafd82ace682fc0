use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

use crate::{
    config,
    error::{AuthError, Error, Result},
    management::TokenExchange,
    server, success,
    types::{PendingSignIn, Token, TokenResponse},
    utils, warning,
};

const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the identity provider's token endpoint.
///
/// Authenticates as a confidential client: the client id and secret travel as
/// HTTP Basic credentials on every request.
#[derive(Clone)]
pub struct SpotifyTokenEndpoint {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl SpotifyTokenEndpoint {
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            client: Client::new(),
            token_url,
            client_id,
            client_secret,
        }
    }

    pub fn from_config() -> Result<Self> {
        Ok(Self::new(
            config::spotify_apitoken_url(),
            config::spotify_client_id()?,
            config::spotify_client_secret()?,
        ))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Completes sign-in by trading the authorization code for a token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<Token> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("code_verifier", code_verifier),
            ])
            .await?;

        let Some(refresh_token) = response.refresh_token else {
            return Err(Error::MalformedResponse(
                "token response without refresh_token".to_string(),
            ));
        };

        Ok(Token::new(
            response.access_token,
            refresh_token,
            response.expires_in,
            utils::now_ms(),
        ))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: self.token_url.clone(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("token response: {}", e)))
    }
}

#[async_trait]
impl TokenExchange for SpotifyTokenEndpoint {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

/// Runs the interactive authorization-code flow with PKCE.
///
/// Starts the local callback server, opens the authorization page in the
/// default browser, waits up to a minute for the redirect, and exchanges the
/// received code for the session's first token.
///
/// # Errors
///
/// - [`Error::Config`] if the callback address cannot be parsed or bound
/// - [`Error::Auth`] if the user denies access, the callback state does not
///   match, or no callback arrives in time
/// - any error of [`SpotifyTokenEndpoint::exchange_code`]
pub async fn sign_in(endpoint: &SpotifyTokenEndpoint) -> Result<Token> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let csrf_state = utils::generate_csrf_state();
    let redirect_uri = config::spotify_redirect_uri();

    let shared_state = Arc::new(Mutex::new(Some(PendingSignIn {
        code_verifier: code_verifier.clone(),
        csrf_state: csrf_state.clone(),
        code: None,
        error: None,
    })));

    // bind before the browser opens so the redirect cannot arrive first
    let listener = server::bind(&config::server_addr()).await?;
    let server_state = Arc::clone(&shared_state);
    let server = tokio::spawn(async move {
        if let Err(e) = server::start_api_server(listener, server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = authorize_url(
        &config::spotify_apiauth_url(),
        endpoint.client_id(),
        &redirect_uri,
        &code_challenge,
        &csrf_state,
        &config::spotify_scope(),
    )?;

    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let code = wait_for_code(shared_state, SIGN_IN_TIMEOUT).await;
    server.abort();
    let token = endpoint
        .exchange_code(&code?, &code_verifier, &redirect_uri)
        .await?;

    success!("Signed in to Spotify.");
    Ok(token)
}

pub fn authorize_url(
    base: &str,
    client_id: &str,
    redirect_uri: &str,
    code_challenge: &str,
    csrf_state: &str,
    scope: &str,
) -> Result<Url> {
    Url::parse_with_params(
        base,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("state", csrf_state),
            ("scope", scope),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid authorization URL {}: {}", base, e)))
}

async fn wait_for_code(
    shared_state: Arc<Mutex<Option<PendingSignIn>>>,
    max_wait: Duration,
) -> Result<String> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        {
            let lock = shared_state.lock().await;
            if let Some(pending) = lock.as_ref() {
                if let Some(error) = &pending.error {
                    warning!("Sign-in failed: {}", error);
                    return Err(AuthError::SignInRequired.into());
                }
                if let Some(code) = &pending.code {
                    return Ok(code.clone());
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    debug!("no sign-in callback within {:?}", max_wait);
    warning!("Sign-in timed out.");
    Err(AuthError::SignInRequired.into())
}
