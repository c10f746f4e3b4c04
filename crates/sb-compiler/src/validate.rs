//! Target-engine regex restrictions
//!
//! Safari's content blocker regex dialect is a small subset of PCRE.
//! Anything outside it makes the whole extension fail to load, so
//! offending url-filters are rejected here with the exact reason.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConvertError;

static QUANTIFIER_BRACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[0-9,]+\}").unwrap());
static UNESCAPED_PIPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\\]+\|+\S*").unwrap());
static NON_ASCII: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\x00-\x7F]").unwrap());
static NEGATIVE_LOOKAHEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\?!.*\)").unwrap());
static UNSUPPORTED_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\\]\\[bBdDfnrsStvwW]").unwrap());

/// Check a url-filter against the restrictions of Safari's regex
/// dialect.
pub fn validate_url_filter(url_filter: &str) -> Result<(), ConvertError> {
    if QUANTIFIER_BRACES.is_match(url_filter) {
        return Err(ConvertError::RegexRejected(
            "Safari doesn't support '{digit}' in regular expressions",
        ));
    }
    if UNESCAPED_PIPE.is_match(url_filter) {
        return Err(ConvertError::RegexRejected(
            "Safari doesn't support '|' in regular expressions",
        ));
    }
    if NON_ASCII.is_match(url_filter) {
        return Err(ConvertError::RegexRejected(
            "Safari doesn't support non-ASCII characters in regular expressions",
        ));
    }
    if NEGATIVE_LOOKAHEAD.is_match(url_filter) {
        return Err(ConvertError::RegexRejected(
            "Safari doesn't support negative lookahead in regular expressions",
        ));
    }
    if UNSUPPORTED_META.is_match(url_filter) {
        return Err(ConvertError::RegexRejected(
            "Safari doesn't support metacharacters like '\\b' or '\\w' in regular expressions",
        ));
    }
    Ok(())
}
