//! Configuration management for the Spotify playlist downloader.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage application
//! configuration including Spotify API credentials, the download backend location,
//! and other runtime parameters.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use tracing::warn;

use crate::error::{Error, Result};

/// Default poll interval of the job monitor.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default scopes: enough to read the user's private and collaborative playlists.
pub const DEFAULT_SCOPE: &str =
    "user-read-email playlist-read-private playlist-read-collaborative user-library-read";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from a `.env` file located in the platform-specific
/// local data directory under `sporldl/.env`. A missing file is not an error:
/// every setting can also come straight from the process environment.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/sporldl/.env`
/// - macOS: `~/Library/Application Support/sporldl/.env`
/// - Windows: `%LOCALAPPDATA%/sporldl/.env`
///
/// # Errors
///
/// This function will return an error if:
/// - The parent directory cannot be created
/// - The `.env` file exists but cannot be read or parsed
///
/// # Example
///
/// ```
/// use sporldl::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<()> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Config(format!("cannot load {}: {}", path.display(), e)))?;
    }
    Ok(())
}

fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporldl/.env");
    path
}

fn required(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("{} must be set", key))),
    }
}

fn or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

/// Returns the bind address of the local OAuth callback server.
///
/// Reads `SERVER_ADDRESS`, defaulting to `127.0.0.1:8888`. The port must match
/// the one in [`spotify_redirect_uri`].
pub fn server_addr() -> String {
    or_default("SERVER_ADDRESS", "127.0.0.1:8888")
}

/// Returns the Spotify API client ID for authentication.
///
/// Retrieves the `SPOTIFY_API_AUTH_CLIENT_ID` environment variable which
/// contains the client ID obtained when registering the application with
/// Spotify's developer platform.
///
/// # Errors
///
/// Returns [`Error::Config`] if the variable is not set.
pub fn spotify_client_id() -> Result<String> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Returns the Spotify API client secret for authentication.
///
/// Retrieves the `SPOTIFY_API_AUTH_CLIENT_SECRET` environment variable. It is
/// sent as the password half of the HTTP Basic credentials on every call to
/// the token endpoint.
///
/// # Errors
///
/// Returns [`Error::Config`] if the variable is not set.
///
/// # Security Note
///
/// The client secret should be kept confidential and never exposed in logs
/// or version control.
pub fn spotify_client_secret() -> Result<String> {
    required("SPOTIFY_API_AUTH_CLIENT_SECRET")
}

/// Returns the Spotify OAuth redirect URI.
///
/// Retrieves the `SPOTIFY_API_REDIRECT_URI` environment variable which specifies
/// the callback URL that Spotify should redirect to after user authorization.
/// This must match the redirect URI registered in the Spotify application settings.
pub fn spotify_redirect_uri() -> String {
    or_default("SPOTIFY_API_REDIRECT_URI", "http://127.0.0.1:8888/callback")
}

/// Returns the Spotify API scope permissions.
///
/// Retrieves `SPOTIFY_API_AUTH_SCOPE`, falling back to [`DEFAULT_SCOPE`].
pub fn spotify_scope() -> String {
    or_default("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

/// Returns the Spotify OAuth authorization URL.
///
/// # Example
///
/// ```
/// let auth_url = spotify_apiauth_url(); // e.g., "https://accounts.spotify.com/authorize"
/// ```
pub fn spotify_apiauth_url() -> String {
    or_default("SPOTIFY_API_AUTH_URL", "https://accounts.spotify.com/authorize")
}

/// Returns the Spotify Web API base URL.
///
/// # Example
///
/// ```
/// let api_url = spotify_apiurl(); // e.g., "https://api.spotify.com/v1"
/// ```
pub fn spotify_apiurl() -> String {
    or_default("SPOTIFY_API_URL", "https://api.spotify.com/v1")
}

/// Returns the Spotify OAuth token exchange URL.
///
/// Used both for the authorization-code exchange that completes sign-in and
/// for every refresh afterwards.
pub fn spotify_apitoken_url() -> String {
    or_default("SPOTIFY_API_TOKEN_URL", "https://accounts.spotify.com/api/token")
}

/// Returns a refresh token to seed the session with, if one is configured.
///
/// When `SPOTIFY_REFRESH_TOKEN` is set the browser sign-in is skipped and the
/// first catalog call performs a refresh instead.
pub fn spotify_refresh_token() -> Option<String> {
    env::var("SPOTIFY_REFRESH_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
}

/// Returns the base URL of the download backend's job API.
pub fn backend_url() -> String {
    or_default("SPORLDL_BACKEND_URL", "http://localhost:8000/api")
        .trim_end_matches('/')
        .to_string()
}

/// Returns the job monitor's poll interval.
///
/// Reads `SPORLDL_POLL_INTERVAL_MS`; an unparsable or zero value falls back to
/// [`DEFAULT_POLL_INTERVAL_MS`].
pub fn poll_interval() -> Duration {
    let raw = or_default("SPORLDL_POLL_INTERVAL_MS", "");
    if raw.is_empty() {
        return Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
    }

    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => {
            warn!(value = %raw, "invalid SPORLDL_POLL_INTERVAL_MS, using default");
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        }
    }
}

/// Returns the `tracing` filter directive for diagnostic logs.
pub fn log_filter() -> String {
    or_default("SPORLDL_LOG", "sporldl=warn")
}
