//! Ignore mask compilation.

use regex::{Regex, RegexBuilder};

use crate::error::IgnoreError;

/// Prefix marking a raw regular expression in `/ignore add`.
pub const REGEX_PREFIX: &str = "re:";

/// Convert an IRC wildcard mask to a regex body.
///
/// `*` matches zero or more characters. It is the only wildcard: every
/// other regex metacharacter, `?` included, is escaped.
pub fn glob_to_regex(glob: &str) -> String {
    let mut regex_pattern = String::with_capacity(glob.len() + 8);
    for c in glob.chars() {
        match c {
            '*' => regex_pattern.push_str(".*"),
            '.' | '?' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\' => {
                regex_pattern.push('\\');
                regex_pattern.push(c);
            }
            _ => regex_pattern.push(c),
        }
    }
    regex_pattern
}

/// Stored mask for a user-supplied mask: `re:` masks are taken verbatim,
/// others are converted from wildcards. Both are anchored as `^...$`.
pub fn user_mask_to_stored(mask: &str) -> String {
    let body = match mask.strip_prefix(REGEX_PREFIX) {
        Some(regex) => regex.to_string(),
        None => glob_to_regex(mask),
    };
    format!("^{body}$")
}

/// Mask shown to users: the stored mask without its anchors.
pub fn display_mask(stored: &str) -> &str {
    let inner = stored.strip_prefix('^').unwrap_or(stored);
    inner.strip_suffix('$').unwrap_or(inner)
}

/// Compile a stored mask (case-insensitive, unanchored search).
pub fn compile(mask: &str) -> Result<Regex, IgnoreError> {
    RegexBuilder::new(mask)
        .case_insensitive(true)
        .build()
        .map_err(|source| IgnoreError::InvalidRegex {
            mask: mask.to_string(),
            source,
        })
}
