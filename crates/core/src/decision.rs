//! The uniform decision record returned by every tier.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder content for a row whose detail view could not be read.
pub const CONTENT_UNAVAILABLE: &str = "İçerik alınamadı";

/// One court decision as listed in a search result.
///
/// `position_in_results` is the 0-based rank inside the extraction batch that
/// produced the record. Sorting by it reproduces the original result order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Decision {
    pub sequence_no: String,
    pub chamber: String,
    pub case_no: String,
    pub ruling_no: String,
    pub ruling_date: String,
    pub content: String,
    pub content_length: usize,
    pub position_in_results: usize,
}

impl Decision {
    /// Build a decision, deriving `content_length` from `content`.
    pub fn new(
        sequence_no: impl Into<String>, chamber: impl Into<String>, case_no: impl Into<String>,
        ruling_no: impl Into<String>, ruling_date: impl Into<String>, content: impl Into<String>,
        position_in_results: usize,
    ) -> Self {
        let content = content.into();
        Self {
            sequence_no: sequence_no.into(),
            chamber: chamber.into(),
            case_no: case_no.into(),
            ruling_no: ruling_no.into(),
            ruling_date: ruling_date.into(),
            content_length: content.chars().count(),
            content,
            position_in_results,
        }
    }

    /// Whether the detail fetch for this row failed.
    pub fn is_content_unavailable(&self) -> bool {
        self.content == CONTENT_UNAVAILABLE
    }
}
