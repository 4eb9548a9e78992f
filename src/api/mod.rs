//! API Module
//!
//! HTTP handlers and routing for the content site backend.
//!
//! # Endpoints
//! - `GET /api/cache/metrics` - Cache metrics snapshot
//! - `POST /api/cache/metrics/reset` - Reset cache metrics
//! - `GET /api/cache/health` - Remote connection and local tier health
//! - `POST /api/cache/reconnect` - Trigger a reconnect attempt
//! - `GET /health` - Health check endpoint
//! - `/api/{builds,dictionary,tier-lists}[/:id]` - Cached content CRUD

pub mod content;
pub mod handlers;
pub mod routes;

pub use content::{Collection, ContentStore};
pub use handlers::*;
pub use routes::create_router;
