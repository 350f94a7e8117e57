//! MCP tool implementations.
//!
//! This module contains all tools exposed by the karar server.

pub mod analytics;
pub mod cache_clear;
pub mod health;
pub mod popular;
pub mod search;
pub mod stats;

pub use analytics::{AnalyticsParams, analytics_impl};
pub use cache_clear::cache_clear_impl;
pub use health::health_impl;
pub use popular::{PopularParams, popular_impl};
pub use search::{SearchParams, search_impl};
pub use stats::stats_impl;
