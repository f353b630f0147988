//! Parsing of labeled-line model output.
//!
//! The generation prompt demands two labeled lines (`TITLE:`,
//! `DESCRIPTION:`). Models drift from instructed formats, so each label
//! falls back independently to a generic default when absent.

use regex::Regex;

/// Default title when the model omits the `TITLE:` label.
pub const DEFAULT_TITLE: &str = "AI Memory";

/// Default description when both the label and the caller's prompt
/// fragment are absent.
pub const DEFAULT_DESCRIPTION: &str = "A cinematic memory.";

/// Title/description pair extracted from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDetails {
    pub title: String,
    pub description: String,
}

/// Extract `TITLE:` and `DESCRIPTION:` lines from free-text output.
///
/// `fallback_context` (the caller's prompt fragment) stands in for a
/// missing description before the generic default does.
pub fn parse_generated_details(text: &str, fallback_context: Option<&str>) -> GeneratedDetails {
    // Labels are matched case-insensitively, value runs to end of line.
    // Post-label whitespace must stay on the same line, so an empty
    // label cannot swallow the following line.
    let title_re = Regex::new(r"(?im)^\s*TITLE:[ \t]*(.*)$").expect("static regex");
    let description_re = Regex::new(r"(?im)^\s*DESCRIPTION:[ \t]*(.*)$").expect("static regex");

    let title = title_re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let description = description_re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            fallback_context
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    GeneratedDetails { title, description }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_both_labels() {
        let text = "TITLE: Golden Hour Farewell\nDESCRIPTION: The last light held us together.";
        let details = parse_generated_details(text, None);
        assert_eq!(details.title, "Golden Hour Farewell");
        assert_eq!(details.description, "The last light held us together.");
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let text = "title: Quiet Morning\ndescription: Coffee and rain.";
        let details = parse_generated_details(text, None);
        assert_eq!(details.title, "Quiet Morning");
        assert_eq!(details.description, "Coffee and rain.");
    }

    #[test]
    fn test_ignores_surrounding_chatter() {
        let text = "Sure! Here you go:\n\nTITLE: Summit Day\nDESCRIPTION: We made it.\n\nHope that helps.";
        let details = parse_generated_details(text, None);
        assert_eq!(details.title, "Summit Day");
        assert_eq!(details.description, "We made it.");
    }

    #[test]
    fn test_missing_title_uses_default() {
        let details = parse_generated_details("DESCRIPTION: Just one line.", None);
        assert_eq!(details.title, DEFAULT_TITLE);
        assert_eq!(details.description, "Just one line.");
    }

    #[test]
    fn test_missing_description_prefers_context() {
        let details = parse_generated_details("TITLE: Beach Day", Some("our trip to Goa"));
        assert_eq!(details.description, "our trip to Goa");
    }

    #[test]
    fn test_missing_everything_uses_defaults() {
        let details = parse_generated_details("unstructured rambling", None);
        assert_eq!(details.title, DEFAULT_TITLE);
        assert_eq!(details.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_empty_label_values_fall_back() {
        let details = parse_generated_details("TITLE:\nDESCRIPTION:   ", Some("context"));
        assert_eq!(details.title, DEFAULT_TITLE);
        assert_eq!(details.description, "context");
    }

    #[test]
    fn test_empty_title_does_not_swallow_next_line() {
        let details = parse_generated_details("TITLE:\nDESCRIPTION: Still here.", None);
        assert_eq!(details.title, DEFAULT_TITLE);
        assert_eq!(details.description, "Still here.");
    }
}
