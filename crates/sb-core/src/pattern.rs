//! Filter pattern to regex source conversion
//!
//! Converts ABP-style URL patterns (`||`, `|`, `*`, `^`) into regex
//! source strings. The start-url and separator fragments are supplied by
//! a [`RegexConfig`] value passed at the call site; there is no shared
//! mutable configuration, so concurrent conversions cannot observe each
//! other's settings.

/// Hostname anchor mask.
pub const MASK_START_URL: &str = "||";
/// Start-of-address anchor mask.
pub const MASK_PIPE: &str = "|";
/// Any-symbol wildcard mask.
pub const MASK_ANY_SYMBOL: &str = "*";
/// Regex fragment matching any run of characters.
pub const REGEX_ANY_CHARACTER: &str = ".*";

/// Regex fragments substituted for the `||` and `^` masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexConfig {
    /// Replacement for the `||` hostname anchor.
    pub regex_start_url: &'static str,
    /// Replacement for the `^` separator mask.
    pub regex_separator: &'static str,
}

impl RegexConfig {
    /// Fragments restricted to Safari's content blocker regex dialect.
    /// The start-url fragment is intentionally loose to bound the
    /// compilation cost of thousands of triggers.
    pub const fn content_blocker() -> Self {
        Self {
            regex_start_url: "^[htpsw]+:\\/\\/([a-z0-9-]+\\.)?",
            regex_separator: "[/:&?]?",
        }
    }
}

impl Default for RegexConfig {
    /// The general-purpose fragments a full matching engine would use.
    /// Rejected by Safari (alternation), hence [`Self::content_blocker`].
    fn default() -> Self {
        Self {
            regex_start_url: "^(http|https|ws|wss):\\/\\/([a-z0-9-_.]+\\.)?",
            regex_separator: "([^ a-zA-Z0-9.%]|$)",
        }
    }
}

/// Convert an ABP-style URL pattern into regex source.
///
/// Match-everything patterns collapse to `.*`. Anchors are translated
/// through `config`, regex metacharacters in the body are escaped, `*`
/// becomes `.*` and `^` becomes the separator fragment. A `|` in the
/// middle of a pattern is left untouched; the target-engine validator is
/// responsible for rejecting it.
pub fn pattern_to_regex(pattern: &str, config: &RegexConfig) -> String {
    if pattern.is_empty()
        || pattern == MASK_START_URL
        || pattern == MASK_PIPE
        || pattern == MASK_ANY_SYMBOL
    {
        return REGEX_ANY_CHARACTER.to_string();
    }

    let (host_anchor, rest) = match pattern.strip_prefix(MASK_START_URL) {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let (start_anchor, rest) = if host_anchor {
        (false, rest)
    } else {
        match rest.strip_prefix(MASK_PIPE) {
            Some(rest) => (true, rest),
            None => (false, rest),
        }
    };
    let (rest, end_anchor) = match rest.strip_suffix(MASK_PIPE) {
        Some(rest) => (rest, true),
        None => (rest, false),
    };

    let mut regex = String::with_capacity(pattern.len() * 2);
    if host_anchor {
        regex.push_str(config.regex_start_url);
    } else if start_anchor {
        regex.push('^');
    }

    for ch in rest.chars() {
        match ch {
            '.' | '+' | '?' | '$' | '{' | '}' | '(' | ')' | '[' | ']' | '/' | '\\' => {
                regex.push('\\');
                regex.push(ch);
            }
            '*' => regex.push_str(REGEX_ANY_CHARACTER),
            '^' => regex.push_str(config.regex_separator),
            _ => regex.push(ch),
        }
    }

    if end_anchor {
        regex.push('$');
    }

    regex
}
