//! Authentication failure detection on CLI stderr.

use once_cell::sync::Lazy;
use regex::RegexSet;

static AUTH_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)not\s+authenticated",
        r"(?i)unauthenticated",
        r"(?i)unauthorized",
        r"(?i)token.*expired",
        r"(?i)please.*log\s*-?\s*in",
        r"(?i)not\s+logged\s+in",
        r"(?i)authentication\s+(failed|required)",
        r"(?i)invalid\s+api\s+key",
        r"(?i)\b401\b",
    ])
    .expect("auth patterns are valid")
});

/// Whether CLI stderr (or a provider error message) indicates missing or expired credentials
pub fn is_authentication_error(text: &str) -> bool {
    AUTH_PATTERNS.is_match(text)
}

/// First non-blank line, for compact error messages
pub(crate) fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}
