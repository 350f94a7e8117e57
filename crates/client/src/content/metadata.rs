//! Decision metadata recovered from free text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static CASE_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Esas\s*No\s*:\s*(\d+/\d+)").expect("invalid case number pattern"));
static RULING_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Karar\s*No\s*:\s*(\d+/\d+)").expect("invalid ruling number pattern"));
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}\.\d{1,2}\.\d{4})").expect("invalid date pattern"));

/// Fields found in a decision's text. Absent fields were not matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMetadata {
    pub case_no: Option<String>,
    pub ruling_no: Option<String>,
    pub date: Option<String>,
}

impl DecisionMetadata {
    pub fn is_empty(&self) -> bool {
        self.case_no.is_none() && self.ruling_no.is_none() && self.date.is_none()
    }
}

fn first_group(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// Find the case number (`Esas No: N/N`), ruling number (`Karar No: N/N`)
/// and the first `d.m.yyyy` date in `text`.
pub fn extract_metadata(text: &str) -> DecisionMetadata {
    DecisionMetadata {
        case_no: first_group(&CASE_NO, text),
        ruling_no: first_group(&RULING_NO, text),
        date: first_group(&DATE, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_all_fields() {
        let text = "T.C. YARGITAY 2. Hukuk Dairesi Esas No: 2023/1234 Karar No : 2024/567 \
                    Tarih: 12.3.2024 Davacı ile davalı arasındaki boşanma davası";
        let meta = extract_metadata(text);
        assert_eq!(meta.case_no.as_deref(), Some("2023/1234"));
        assert_eq!(meta.ruling_no.as_deref(), Some("2024/567"));
        assert_eq!(meta.date.as_deref(), Some("12.3.2024"));
    }

    #[test]
    fn test_extract_case_insensitive() {
        let meta = extract_metadata("ESAS NO:2021/9 karar no: 2022/10");
        assert_eq!(meta.case_no.as_deref(), Some("2021/9"));
        assert_eq!(meta.ruling_no.as_deref(), Some("2022/10"));
        assert!(meta.date.is_none());
    }

    #[test]
    fn test_extract_nothing() {
        let meta = extract_metadata("içerik yok");
        assert!(meta.is_empty());
        assert_eq!(meta, DecisionMetadata::default());
    }
}
