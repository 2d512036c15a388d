//! API Module
//!
//! HTTP handlers and routing for the cache admin server.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Uncache a key
//! - `DELETE /prefix/:prefix` - Uncache every key with a prefix
//! - `POST /broadcast` - Multicast a prefix invalidation
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
