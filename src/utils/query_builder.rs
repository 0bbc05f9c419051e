//! Search query derivation from bill titles.
//!
//! Amendment-type suffixes ("partial amendment act…", "일부개정법률안…") and
//! parenthetical annotations do not change which law a bill touches, but they
//! drown the law name in a news search. The query keeps only the law name.

use std::sync::LazyLock;

use regex::Regex;

use super::title_normalizer::normalize_title;

static AMENDMENT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(일부개정법률안|전부개정법률안|일부개정|전부개정|\b(partial|full|total|wholly)\s+amendment\b).*",
    )
    .expect("amendment suffix pattern is valid")
});

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)|（.*?）").expect("parenthetical pattern is valid"));

/// Builds the search query for a bill title.
///
/// Falls back to the normalized title when stripping leaves nothing.
pub fn build_search_query(title: &str) -> String {
    let normalized = normalize_title(title);
    let without_suffix = AMENDMENT_SUFFIX.replace(&normalized, "");
    let without_notes = PARENTHETICAL.replace_all(&without_suffix, " ");
    let cleaned = normalize_title(&without_notes);

    if cleaned.is_empty() {
        normalized
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_korean_partial_amendment() {
        assert_eq!(
            build_search_query("청소년 보호법 일부개정법률안(김철수의원 등 10인)"),
            "청소년 보호법"
        );
    }

    #[test]
    fn test_strips_full_amendment_short_form() {
        assert_eq!(build_search_query("전세사기특별법 전부개정안"), "전세사기특별법");
    }

    #[test]
    fn test_strips_english_amendment_suffix() {
        assert_eq!(
            build_search_query("Youth Protection Act Partial Amendment Act (Rep. Kim)"),
            "Youth Protection Act"
        );
    }

    #[test]
    fn test_strips_parentheticals_only() {
        assert_eq!(
            build_search_query("Aviation Safety Act (government bill)"),
            "Aviation Safety Act"
        );
        assert_eq!(build_search_query("항공안전법（대안）"), "항공안전법");
    }

    #[test]
    fn test_keeps_plain_title() {
        assert_eq!(build_search_query("Design Protection Act"), "Design Protection Act");
    }

    #[test]
    fn test_falls_back_when_everything_stripped() {
        assert_eq!(build_search_query("일부개정법률안"), "일부개정법률안");
    }
}
