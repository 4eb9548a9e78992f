//! Middleware Module
//!
//! Axum middleware stages of the cache layer.
//!
//! # Stages
//! - `track_metrics` - wraps every request (outermost)
//! - `read_through` - serves and captures cached GET responses
//! - `invalidate` - drops cached entries after successful mutations

mod invalidation;
mod metrics;
mod outcome;
mod read_through;

pub use invalidation::{invalidate, Invalidation};
pub use metrics::{track_metrics, UNMATCHED_ROUTE};
pub use outcome::{CacheOutcome, X_CACHE, X_CACHE_INVALIDATED, X_CACHE_KEY, X_RESPONSE_TIME};
pub use read_through::{default_cache_key, read_through, Bypass, CachePolicy, ReadThrough};
