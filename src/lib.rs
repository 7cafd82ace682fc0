//! Spotify Playlist Downloader CLI Library
//!
//! This library lets a user sign in to Spotify, pick any subset of their
//! playlists and the tracks within them, and hand that selection to a download
//! backend whose progress is polled until the job finishes or is cancelled.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local sign-in callback server
//! - `backend` - Download backend client and the job monitor poll loop
//! - `batch` - Turns a selection plus the track cache into a download request
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Session state: tokens, the track cache and the selection
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify identity provider and catalog clients
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use sporldl::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> sporldl::Res<()> {
//!     config::load_env().await?;
//!     cli::list_playlists(None).await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backend;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{AuthError, Error, Result};

/// A convenient Result type alias for top-level glue code.
///
/// Library operations return the typed [`Result`]; this boxed alias is kept for
/// the binary and other call sites that only need to report a failure.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching playlists...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Signed in to Spotify");
/// success!("Downloaded {} tracks", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for unrecoverable failures in command implementations; library code
/// returns errors instead.
///
/// # Example
///
/// ```
/// error!("Cannot reach the download backend");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Playlist {} is no longer in your library", id);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
