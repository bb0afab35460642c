//! Translation of the restricted message-pattern syntax to glob patterns.
//!
//! Diagnostic messages routinely contain `[`, `]`, and `?`, which are glob
//! metacharacters, so test descriptions use a restricted syntax instead of
//! raw globs: everything matches literally except `**`, which matches any
//! remainder of the message.

/// Converts a restricted message pattern into a glob pattern.
///
/// A `**` collapses the entire remainder of the pattern into a single
/// match-anything token and ends translation; anything after it is
/// discarded. The glob metacharacters `?`, `[`, and `]` are escaped by
/// wrapping them in a bracket expression. All other characters pass
/// through unchanged.
pub fn translate(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with("**") {
            glob.push_str("[*]");
            break;
        }
        match c {
            '?' | '[' | ']' => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            _ => glob.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
    glob
}
