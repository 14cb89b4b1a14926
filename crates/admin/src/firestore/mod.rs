//! Cloud Firestore REST API client.
//!
//! The dashboard talks to Firestore through the v1 REST surface only:
//!
//! - `GET    …/documents/{collection}` (paged with `nextPageToken`)
//! - `POST   …/documents/{collection}` (server-assigned identifier)
//! - `PATCH  …/documents/{collection}/{id}` (field mask, must exist)
//! - `DELETE …/documents/{collection}/{id}`
//!
//! Documents travel as typed values (`{"stringValue": "…"}`); [`value`]
//! converts them to and from plain JSON field maps so the rest of the crate
//! never sees the wire encoding.
//!
//! No retries or backoff are attempted; a rate-limit response is surfaced as
//! [`FirestoreError::RateLimited`] with the server's `Retry-After` hint.
//!
//! # Example
//!
//! ```rust,ignore
//! use storedesk_admin::firestore::FirestoreClient;
//!
//! let client = FirestoreClient::new(&config.firestore)?;
//! let products = client.list_documents("products").await?;
//! ```

mod client;
pub mod types;
pub mod value;

pub use client::FirestoreClient;

use thiserror::Error;

/// Errors that can occur when interacting with the Firestore REST API.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot address documents.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Document or collection not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Firestore.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other error reported in the Google API error envelope.
    #[error("Firestore error {code} ({status}): {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    /// A returned document name had no identifier segment.
    #[error("Malformed document name: {0}")]
    MalformedName(String),
}

impl From<url::ParseError> for FirestoreError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firestore_error_display() {
        let err = FirestoreError::NotFound("products/abc".to_string());
        assert_eq!(err.to_string(), "Not found: products/abc");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = FirestoreError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }

    #[test]
    fn test_api_error_display() {
        let err = FirestoreError::Api {
            code: 400,
            status: "INVALID_ARGUMENT".to_string(),
            message: "bad field path".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Firestore error 400 (INVALID_ARGUMENT): bad field path"
        );
    }
}
