//! yargitay_search_optimized tool implementation.
//!
//! Resolves a query through the cache tiers and renders a readable summary
//! next to the structured decisions.

use crate::error::{error_result, failure_result, json_result};
use karar_client::{Resolver, highlight_keywords, truncate};
use karar_core::{Decision, Source};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Characters of decision text shown per result in `formatted`.
const PREVIEW_CHARS: usize = 1000;

const MIN_QUERY_CHARS: usize = 2;

/// Input parameters for yargitay_search_optimized tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Search terms, at least 2 characters.
    pub query: String,

    /// Drop the in-memory entry before resolving.
    #[serde(default)]
    pub refresh: bool,
}

/// Output structure for yargitay_search_optimized tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchOutput {
    /// Human-readable rendering of the results.
    pub formatted: String,
    pub success: bool,
    /// The trimmed query.
    pub query: String,
    pub results: Vec<Decision>,
    pub metadata: SearchMeta,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchMeta {
    pub source: Source,
    /// Whether a cache tier answered.
    pub cached: bool,
    /// Age of a persistent hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
    pub result_count: usize,
    pub total_ms: u64,
}

/// Render decisions as numbered text blocks with highlighted previews.
pub fn format_results(query: &str, decisions: &[Decision]) -> String {
    if decisions.is_empty() {
        return "No results found.".to_string();
    }

    decisions
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let preview = highlight_keywords(&truncate(&d.content, PREVIEW_CHARS), query);
            format!(
                "Result {}\nSıra No: {}\nDaire: {}\nEsas: {}\nKarar: {}\nTarih: {}\nİçerik:\n{}\n--------------------",
                i + 1,
                d.sequence_no,
                d.chamber,
                d.case_no,
                d.ruling_no,
                d.ruling_date,
                preview
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Implementation of the yargitay_search_optimized tool.
pub async fn search_impl(resolver: &Resolver, params: SearchParams) -> Result<CallToolResult, McpError> {
    let query = params.query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(error_result(
            format!("query must be a string with at least {MIN_QUERY_CHARS} characters"),
            None,
        ));
    }

    let started = Instant::now();
    let resolution = match resolver.resolve(query, params.refresh).await {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!(query, error = %e, "search failed");
            return Ok(failure_result("search failed", e));
        }
    };

    let output = SearchOutput {
        formatted: format_results(query, &resolution.data),
        success: true,
        query: query.to_string(),
        metadata: SearchMeta {
            source: resolution.source,
            cached: resolution.source != Source::Extraction,
            age_ms: resolution.metadata.as_ref().map(|m| m.age_ms),
            result_count: resolution.data.len(),
            total_ms: started.elapsed().as_millis() as u64,
        },
        results: resolution.data,
    };

    json_result(&output)
}
