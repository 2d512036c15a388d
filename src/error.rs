//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache lookups never fail;
//! these errors come from the invalidation transport and the admin API.

use std::net::IpAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data or invalidation payload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalidation group is not a multicast address
    #[error("Not a multicast address: {0}")]
    NotMulticast(IpAddr),

    /// No invalidation group configured
    #[error("Multicast invalidation is not configured")]
    MulticastNotConfigured,

    /// Socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::NotMulticast(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::MulticastNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Io(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
