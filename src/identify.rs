//! Medicine name heuristics
//!
//! Pure, purely syntactic guess at the product name on a label. Brand names
//! are usually printed in capitals, so the first all-caps alphabetic word
//! longer than 3 characters wins; otherwise the first non-empty line.

/// Maximum length of the first-line fallback, to avoid returning a paragraph.
const FALLBACK_LINE_LIMIT: usize = 30;

/// Guess the medicine name from OCR text.
///
/// Returns an empty string when the text contains nothing identifiable;
/// callers treat that as "no medicine name found".
pub fn identify(text: &str) -> String {
    let trimmed = text.trim();

    // All-caps words scanned top-to-bottom, left-to-right. First match wins.
    for line in trimmed.split('\n') {
        for word in line.split_whitespace() {
            if word.chars().count() > 3
                && word.chars().all(|c| c.is_alphabetic() && c.is_uppercase())
            {
                return word.to_string();
            }
        }
    }

    // Fall back to the first non-empty line, truncated.
    trimmed
        .split('\n')
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(FALLBACK_LINE_LIMIT).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_first_all_caps_word() {
        let text = "PARACETAMOL\n500mg Tablets";
        assert_eq!(identify(text), "PARACETAMOL");
    }

    #[test]
    fn test_scans_lines_top_to_bottom_then_words_left_to_right() {
        let text = "take two daily\nwith WATER before MEALS";
        assert_eq!(identify(text), "WATER");
    }

    #[test]
    fn test_ignores_short_and_mixed_case_words() {
        // "ABC" is too short, "Ibuprofen" is not all caps, "B12X2" is not alphabetic
        let text = "ABC Ibuprofen B12X2\nNAPROXEN 250mg";
        assert_eq!(identify(text), "NAPROXEN");
    }

    #[test]
    fn test_falls_back_to_first_nonempty_line() {
        let text = "aspirin 100mg coated tablets";
        assert_eq!(identify(text), "aspirin 100mg coated tablets");
    }

    #[test]
    fn test_fallback_truncates_to_thirty_chars() {
        let line = "a very long first line that keeps going and going";
        let name = identify(line);
        assert_eq!(name.chars().count(), 30);
        assert_eq!(name, line.chars().take(30).collect::<String>());
    }

    #[test]
    fn test_fallback_skips_leading_blank_lines() {
        let text = "\n   \nlow dose aspirin\n";
        assert_eq!(identify(text), "low dose aspirin");
    }

    #[test]
    fn test_empty_and_whitespace_text_yield_empty() {
        assert_eq!(identify(""), "");
        assert_eq!(identify("   \n \t \n"), "");
    }

    #[test]
    fn test_idempotent() {
        let text = "PARACETAMOL\n500mg Tablets";
        assert_eq!(identify(text), identify(text));
    }
}
