use regex::{Regex, RegexBuilder};

/// Translate a wildcard pattern to an anchored regex.
/// `%` matches any run of characters (including none), `_` exactly one.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("^(?s:");
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push_str(")$");
    regex
}

/// Compile a wildcard pattern; matching ignores case unless asked not to
pub fn compile_wildcard(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    RegexBuilder::new(&wildcard_to_regex(pattern))
        .case_insensitive(!case_sensitive)
        .build()
        .ok()
}

/// One-off wildcard match
pub fn wildcard_match(text: &str, pattern: &str, case_sensitive: bool) -> bool {
    compile_wildcard(pattern, case_sensitive).is_some_and(|re| re.is_match(text))
}
