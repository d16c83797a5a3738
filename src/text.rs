//! Cleanup of transcription artifacts and filesystem-safe naming.

use regex::Regex;
use std::sync::LazyLock;

/// Bracketed noise tags such as `[Music]` or `(laughs)`.
static ARTIFACT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*?\]|\([^)]*?\)").expect("artifact pattern is valid"));

const FORBIDDEN_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

pub const MAX_FILENAME_CHARS: usize = 60;

/// Remove `[...]` and `(...)` spans and trim surrounding whitespace.
///
/// Removal repeats until nothing matches so nested or re-formed spans like
/// `[[x]]` do not leave a delimited remainder behind.
pub fn clean_artifacts(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = ARTIFACT_PATTERN.replace_all(&current, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

/// Strip characters that are invalid in filenames, trim, and cap the length
/// at [`MAX_FILENAME_CHARS`] characters.
pub fn sanitize_filename(name: &str) -> String {
    let mut current: String = name
        .chars()
        .filter(|c| !FORBIDDEN_FILENAME_CHARS.contains(c))
        .collect();

    loop {
        let next: String = current.trim().chars().take(MAX_FILENAME_CHARS).collect();
        if next == current {
            return next;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_artifacts_removes_tags() {
        assert_eq!(clean_artifacts("[Music] Hello there (laughs) "), "Hello there");
        assert_eq!(clean_artifacts("  plain text  "), "plain text");
        assert_eq!(clean_artifacts("[] () empty"), "empty");
        assert_eq!(clean_artifacts("[Applause]"), "");
    }

    #[test]
    fn test_clean_artifacts_is_non_greedy() {
        assert_eq!(clean_artifacts("a [x] b [y] c"), "a  b  c");
        assert_eq!(clean_artifacts("f(x) and g(y)"), "f and g");
    }

    #[test]
    fn test_clean_artifacts_idempotent() {
        let samples = [
            "[[nested]] text",
            "((a)b) c",
            "([mixed)] d",
            " (open only",
            "close only] ",
            "Mix [a](b)[c] end",
        ];
        for sample in samples {
            let once = clean_artifacts(sample);
            assert_eq!(clean_artifacts(&once), once, "not idempotent for {:?}", sample);
            assert!(!ARTIFACT_PATTERN.is_match(&once), "delimited span left in {:?}", once);
        }
    }

    #[test]
    fn test_sanitize_filename_strips_forbidden() {
        assert_eq!(
            sanitize_filename(r#"What is C++? A "guide" <part 1/2> | a:b*c\d"#),
            "What is C++ A guide part 12  abcd"
        );
    }

    #[test]
    fn test_sanitize_filename_truncates() {
        let long = "x".repeat(100);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_FILENAME_CHARS);

        let farsi = "س".repeat(80);
        assert_eq!(sanitize_filename(&farsi).chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn test_sanitize_filename_idempotent() {
        let near_limit = format!("{} tail", "a".repeat(59));
        let samples = [
            "  padded title  ",
            near_limit.as_str(),
            "a/b\\c:d",
            "",
        ];
        for sample in samples {
            let once = sanitize_filename(sample);
            assert!(once.chars().count() <= MAX_FILENAME_CHARS);
            assert!(!once.contains(FORBIDDEN_FILENAME_CHARS));
            assert_eq!(sanitize_filename(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
