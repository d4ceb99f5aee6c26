//! API Module
//!
//! HTTP handlers and routing hosting the dependency cache.
//!
//! # Endpoints
//! - `GET /books?fields=...` - Cached demo query
//! - `POST /feed/advance` - Change feed input
//! - `GET /versions`, `GET /versions/:constraint` - Constraint versions
//! - `GET /cache/:key`, `DELETE /cache/:key` - Raw cache access
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
