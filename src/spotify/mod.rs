//! # Spotify Integration Module
//!
//! HTTP clients for the two Spotify services the downloader consumes: the
//! identity provider's token endpoint and the Web API catalog.
//!
//! ## Architecture
//!
//! ```text
//! CLI / Batch Builder
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization code + PKCE, refresh)
//!     └── Catalog (paginated playlist and track listings)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API / Accounts service
//! ```
//!
//! ## Authentication
//!
//! [`auth`] runs the interactive sign-in and implements
//! [`TokenExchange`](crate::management::TokenExchange) for refreshes. Every
//! call to the token endpoint carries the client id and secret as HTTP Basic
//! credentials.
//!
//! ## Catalog
//!
//! [`catalog`] drains cursor-paginated listings: each page is requested with a
//! freshly validated bearer token, the provider's `next` URL is followed until
//! absent, and items with an identity already seen in the same drain are
//! dropped. A 401 on any page aborts the drain rather than returning a partial
//! list.
//!
//! ### Endpoints
//! - `GET /me/playlists` - the signed-in user's playlists
//! - `GET /playlists/{id}/tracks` - one playlist's tracks
//! - `POST /api/token` - code exchange and refresh
//!
//! ## Error Types
//!
//! All functions return [`crate::Result`]. Authentication failures surface as
//! [`crate::Error::Auth`] or [`crate::Error::PaginationAuth`]; everything that
//! should offer the user a retry is in the
//! [`is_network`](crate::Error::is_network) class.

pub mod auth;
pub mod catalog;

pub use auth::SpotifyTokenEndpoint;
pub use catalog::{CatalogItem, SpotifyCatalog, TrackSource, fetch_all};
