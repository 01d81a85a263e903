//! API Module
//!
//! HTTP surface over the cache service, used by the host binary for
//! inspection and manual invalidation.
//!
//! # Endpoints
//! - `PUT /cache` - Store a JSON value
//! - `GET /cache/:key` - Retrieve a value by key
//! - `DELETE /cache/:key` - Invalidate a key
//! - `POST /invalidate` - Invalidate by pattern
//! - `GET /stats` - Fallback store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
