//! Error types shared by the token, catalog, batch and job layers.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons the session cannot talk to the catalog on the user's behalf.
///
/// Both variants are resolved the same way: the user signs in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token is held; an interactive sign-in has to happen first.
    #[error("not signed in")]
    SignInRequired,

    /// A token is held but its last refresh failed, so it must not be used.
    #[error("access token refresh failed")]
    RefreshFailed,
}

/// Errors produced by sporldl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Sign-in required or the token is flagged unusable.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The catalog answered 401 part way through draining a paginated listing.
    #[error("Catalog rejected the access token while fetching {url}")]
    PaginationAuth {
        /// Page that was rejected.
        url: String,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response arrived with a status the caller cannot work with.
    #[error("Unexpected HTTP status {status} from {url}")]
    Http {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The download job could not be created.
    #[error("Download job could not be created: {0}")]
    Submit(String),

    /// The payload did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A required setting is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the only remedy is sending the user back to sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::PaginationAuth { .. })
    }

    /// True for transport failures and unexpected payloads, which share the
    /// "show a retry affordance" treatment.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Http { .. } | Error::MalformedResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err: Error = AuthError::RefreshFailed.into();
        assert_eq!(
            err.to_string(),
            "Authentication error: access token refresh failed"
        );
    }

    #[test]
    fn test_pagination_auth_requires_sign_in() {
        let err = Error::PaginationAuth {
            url: "https://api.example/me/playlists".to_string(),
        };
        assert!(err.requires_sign_in());
        assert!(!err.is_network());
        assert!(err.to_string().contains("/me/playlists"));
    }

    #[test]
    fn test_malformed_response_is_network_class() {
        let err = Error::MalformedResponse("missing field `items`".to_string());
        assert!(err.is_network());
        assert!(!err.requires_sign_in());
    }

    #[test]
    fn test_submit_error_is_neither_auth_nor_network() {
        let err = Error::Submit("connection refused".to_string());
        assert!(!err.is_network());
        assert!(!err.requires_sign_in());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
