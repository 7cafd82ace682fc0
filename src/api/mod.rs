//! # API Module
//!
//! HTTP endpoints of the short-lived local server that receives the OAuth
//! redirect during interactive sign-in.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives Spotify's redirect. It checks the `state`
//!   parameter against the one generated for this sign-in and records either
//!   the authorization code or the provider's error for the waiting sign-in
//!   flow. The code exchange itself happens in
//!   [`crate::spotify::auth::sign_in`], not in the handler.
//! - [`health`] - Liveness check returning the crate version.
//!
//! The server only runs while a sign-in is waiting and is aborted as soon as
//! the code (or an error) arrives or the wait times out.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let state = Arc::new(Mutex::new(None));
//! let app = sporldl::server::router(state);
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
