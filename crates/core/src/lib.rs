//! Core types and shared functionality for karar.
//!
//! This crate provides:
//! - The hot (in-process) and persistent (SQLite) cache tiers
//! - The decision record shared by every tier
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod decision;
pub mod error;

pub use cache::{CacheDb, DetachedStore, HotCache, ResultStore, ScrapeStat, Source, StoredSearch};
pub use config::{AppConfig, ConfigError};
pub use decision::{CONTENT_UNAVAILABLE, Decision};
pub use error::Error;
