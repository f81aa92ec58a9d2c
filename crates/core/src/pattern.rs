//! Name patterns: shell-style globs for artifact files and SQL `LIKE`
//! filters for fuzzy job lookup.

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::CoreError;

/// Pattern used when a watch does not name one.
pub const DEFAULT_ARTIFACT_PATTERN: &str = "*.xlsx";

/// Compiled once. The input is a fixed literal exercised by the unit tests,
/// so the build cannot fail at runtime.
static DEFAULT_PATTERN: LazyLock<FilePattern> = LazyLock::new(|| {
    FilePattern::new(DEFAULT_ARTIFACT_PATTERN).expect("default artifact pattern is always valid")
});

/// A filename glob supporting `*`, `?` and `[...]` classes.
///
/// Matching is against the bare file name, case-insensitive on Windows.
/// As with shell globbing, `*` and `?` never match a leading dot.
#[derive(Debug, Clone)]
pub struct FilePattern {
    raw: String,
    regex: Regex,
}

impl FilePattern {
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() {
            return Err(CoreError::Validation(
                "File pattern must not be empty".to_string(),
            ));
        }
        if raw.contains(['/', '\\']) {
            return Err(CoreError::Validation(format!(
                "File pattern '{raw}' must be a file name, not a path"
            )));
        }
        let regex = RegexBuilder::new(&glob_to_regex(raw))
            .case_insensitive(cfg!(windows))
            .build()
            .map_err(|e| CoreError::Validation(format!("Invalid file pattern '{raw}': {e}")))?;
        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, file_name: &str) -> bool {
        if file_name.starts_with('.') && !self.raw.starts_with('.') {
            return false;
        }
        self.regex.is_match(file_name)
    }
}

impl Default for FilePattern {
    fn default() -> Self {
        DEFAULT_PATTERN.clone()
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let negated = chars.next_if_eq(&'!').is_some();
                let mut class = String::new();
                let mut closed = false;
                // A `]` right after `[` or `[!` is a member, not the close.
                for next in chars.by_ref() {
                    if next == ']' && !class.is_empty() {
                        closed = true;
                        break;
                    }
                    class.push(next);
                }
                if closed {
                    out.push('[');
                    if negated {
                        out.push('^');
                    }
                    out.push_str(&escape_class(&class));
                    out.push(']');
                } else {
                    out.push_str(&regex::escape("["));
                    if negated {
                        out.push('!');
                    }
                    out.push_str(&regex::escape(&class));
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

fn escape_class(class: &str) -> String {
    class
        .chars()
        .map(|c| match c {
            '\\' | '[' | ']' | '^' | '&' | '~' => format!("\\{c}"),
            other => other.to_string(),
        })
        .collect()
}

/// Turn a job name into a `LIKE` filter.
///
/// Input that already uses `%` or `_` is taken as the caller's own pattern;
/// anything else becomes a substring match.
pub fn like_filter(job_name: &str) -> String {
    if job_name.contains(['%', '_']) {
        job_name.to_string()
    } else {
        format!("%{job_name}%")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_matches_workbooks() {
        let pattern = FilePattern::default();
        assert_eq!(pattern.as_str(), "*.xlsx");
        assert!(pattern.matches("report.xlsx"));
        assert!(!pattern.matches("report.xlsx.tmp"));
        assert!(!pattern.matches("report.csv"));
    }

    #[test]
    fn star_and_question_mark() {
        let pattern = FilePattern::new("MRP_??_*.csv").expect("valid");
        assert!(pattern.matches("MRP_W1_2024.csv"));
        assert!(!pattern.matches("MRP_W12_2024.csv.bak"));
        assert!(!pattern.matches("MRP_W_2024.csv"));
    }

    #[test]
    fn literal_dots_are_escaped() {
        let pattern = FilePattern::new("a.b").expect("valid");
        assert!(pattern.matches("a.b"));
        assert!(!pattern.matches("axb"));
    }

    #[test]
    fn character_classes() {
        let pattern = FilePattern::new("v[0-9].txt").expect("valid");
        assert!(pattern.matches("v3.txt"));
        assert!(!pattern.matches("vx.txt"));

        let negated = FilePattern::new("v[!0-9].txt").expect("valid");
        assert!(negated.matches("vx.txt"));
        assert!(!negated.matches("v3.txt"));
    }

    #[test]
    fn leading_bracket_is_a_class_member() {
        let not_bracket = FilePattern::new("v[!]].txt").expect("valid");
        assert!(not_bracket.matches("v1.txt"));
        assert!(!not_bracket.matches("v].txt"));

        let bracket_or_a = FilePattern::new("v[]a].txt").expect("valid");
        assert!(bracket_or_a.matches("v].txt"));
        assert!(bracket_or_a.matches("va.txt"));
        assert!(!bracket_or_a.matches("vb.txt"));
    }

    #[test]
    fn lone_brackets_stay_literal() {
        assert!(FilePattern::new("odd[]").expect("valid").matches("odd[]"));
        assert!(FilePattern::new("odd[!]").expect("valid").matches("odd[!]"));
    }

    #[test]
    fn default_is_shared_and_reusable() {
        let first = FilePattern::default();
        let second = FilePattern::default();
        assert_eq!(first.as_str(), second.as_str());
        assert!(second.matches("summary.xlsx"));
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        let pattern = FilePattern::new("odd[name").expect("valid");
        assert!(pattern.matches("odd[name"));
    }

    #[test]
    fn hidden_files_need_explicit_dot() {
        assert!(!FilePattern::new("*").expect("valid").matches(".hidden"));
        assert!(FilePattern::new(".*").expect("valid").matches(".hidden"));
    }

    #[test]
    fn rejects_empty_and_paths() {
        assert!(FilePattern::new("").is_err());
        assert!(FilePattern::new("sub/*.xlsx").is_err());
        assert!(FilePattern::new(r"sub\*.xlsx").is_err());
    }

    #[test]
    fn like_filter_wraps_plain_names() {
        assert_eq!(like_filter("Waterfall"), "%Waterfall%");
        assert_eq!(like_filter("MRP%"), "MRP%");
        assert_eq!(like_filter("SC_MRP"), "SC_MRP");
    }
}
