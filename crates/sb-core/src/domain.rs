//! Domain name normalization
//!
//! Safari requires `if-domain`/`unless-domain` values to be lowercase
//! ASCII, so internationalized names go through punycode.

use once_cell::sync::Lazy;
use regex::Regex;

static VALID_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-.]*[a-zA-Z0-9]\.[a-zA-Z-]{2,}$").unwrap());

/// Lowercase a domain and encode it to ASCII-compatible form.
/// Falls back to plain lowercasing when the IDN mapping fails; the
/// value will then fail shape validation downstream.
pub fn to_punycode(domain: &str) -> String {
    if domain.is_ascii() {
        return domain.to_ascii_lowercase();
    }
    idna::domain_to_ascii(domain).unwrap_or_else(|_| domain.to_lowercase())
}

/// Shape check for something that can appear in a domain list.
pub fn is_valid_domain(domain: &str) -> bool {
    VALID_DOMAIN.is_match(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_lowercased() {
        assert_eq!(to_punycode("Example.COM"), "example.com");
    }

    #[test]
    fn test_idn_is_punycoded() {
        assert_eq!(to_punycode("пример.рф"), "xn--e1afmkfd.xn--p1ai");
    }

    #[test]
    fn test_valid_domain_shapes() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("sub.example.co.uk"));
        assert!(is_valid_domain("a-b.example.org"));
        assert!(!is_valid_domain("example"));
        assert!(!is_valid_domain("-example.com"));
        assert!(!is_valid_domain("example-.com"));
        assert!(!is_valid_domain("example.com/path"));
        assert!(!is_valid_domain(""));
    }
}
