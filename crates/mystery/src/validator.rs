//! Textual denylist screening
//!
//! Source text is matched against an ordered list of signatures for
//! operations the playground refuses to run. This is a pre-filter only:
//! indirect or obfuscated spellings of the same operations are not caught.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Language;

/// A named signature of a dangerous construct
#[derive(Debug)]
pub struct DangerousPattern {
    /// Stable identifier, safe to log
    pub id: &'static str,
    regex: Regex,
}

impl DangerousPattern {
    fn new(id: &'static str, pattern: &str) -> Self {
        Self {
            id,
            regex: Regex::new(pattern).expect("built-in denylist pattern should compile"),
        }
    }

    /// Check whether the pattern occurs anywhere in `source`
    pub fn matches(&self, source: &str) -> bool {
        self.regex.is_match(source)
    }
}

// Ordered; the first match is the one reported.
static PYTHON_PATTERNS: LazyLock<Vec<DangerousPattern>> = LazyLock::new(|| {
    vec![
        DangerousPattern::new("import-os", r"import\s+os"),
        DangerousPattern::new("import-subprocess", r"import\s+subprocess"),
        DangerousPattern::new("import-sys", r"import\s+sys"),
        DangerousPattern::new("dunder-import", r"__import__"),
        DangerousPattern::new("eval-call", r"eval\("),
        DangerousPattern::new("exec-call", r"exec\("),
        DangerousPattern::new("open-call", r"open\("),
        DangerousPattern::new("file-call", r"file\("),
        DangerousPattern::new("input-call", r"input\("),
        DangerousPattern::new("raw-input-call", r"raw_input\("),
        DangerousPattern::new("compile-call", r"compile\("),
        DangerousPattern::new("builtins-access", r"__builtins__"),
    ]
});

/// Outcome of screening a piece of source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe { pattern: &'static str },
}

impl Verdict {
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }
}

/// The ordered denylist for a language
pub fn patterns(language: Language) -> &'static [DangerousPattern] {
    match language {
        Language::Python => &PYTHON_PATTERNS,
    }
}

/// Screen `source`, reporting the first pattern that matches
pub fn check(language: Language, source: &str) -> Verdict {
    patterns(language)
        .iter()
        .find(|pattern| pattern.matches(source))
        .map_or(Verdict::Safe, |pattern| Verdict::Unsafe { pattern: pattern.id })
}

/// Shorthand for `check(..).is_safe()`
pub fn is_safe(language: Language, source: &str) -> bool {
    check(language, source).is_safe()
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn check_never_panics(source in "(?s).*") {
            let _ = check(Language::Python, &source);
        }

        #[test]
        fn verdict_agrees_with_is_safe(source in "(?s).{0,200}") {
            prop_assert_eq!(
                check(Language::Python, &source).is_safe(),
                is_safe(Language::Python, &source)
            );
        }

        #[test]
        fn appending_a_dangerous_call_is_always_unsafe(
            prefix in "(?s).{0,100}",
            index in 0usize..12,
        ) {
            let samples = [
                "import os", "import subprocess", "import sys", "__import__",
                "eval(", "exec(", "open(", "file(", "input(", "raw_input(",
                "compile(", "__builtins__",
            ];
            let source = format!("{prefix}\n{}", samples[index]);
            prop_assert!(!is_safe(Language::Python, &source));
        }

        #[test]
        fn identifiers_and_digits_are_safe(source in "[a-z0-9_ =+*\n]{0,100}") {
            // Without parentheses only the import and dunder patterns can match.
            prop_assume!(!source.contains("import") && !source.contains("__"));
            prop_assert!(is_safe(Language::Python, &source));
        }
    }
}
