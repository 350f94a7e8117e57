//! Extraction and resolution for karar.
//!
//! This crate provides the content normalizer, the rendering capability with
//! its chromiumoxide adapter, the extraction pipeline that drives the search
//! site, and the resolver that puts the cache tiers in front of it.

pub mod content;
pub mod pipeline;
pub mod render;
pub mod resolve;

#[cfg(test)]
mod testing;

pub use content::{clean, extract_metadata, highlight_keywords, truncate};
pub use pipeline::{DecisionSource, ExtractionPipeline, PipelineSettings, SiteProfile};
pub use render::{DisabledProvider, RenderError, RenderSession, SessionGuard, SessionProvider};
pub use resolve::{CleanupReport, Resolution, ResolutionMeta, Resolver, ResolverSettings, ResolverStats};

#[cfg(feature = "render")]
pub use render::ChromeSessionProvider;
