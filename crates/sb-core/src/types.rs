//! Core type definitions for SafariBlocker
//!
//! Content types and rule options are fixed-width bitmasks with named
//! constants; whitelist option predicates compare for exact equality,
//! not subset membership.

// =============================================================================
// Content Types (bit mask for resource type filtering)
// =============================================================================

bitflags::bitflags! {
    /// Content type bit mask carried by URL rules.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContentType: u32 {
        const IMAGE = 1 << 0;
        const STYLESHEET = 1 << 1;
        const SCRIPT = 1 << 2;
        const MEDIA = 1 << 3;
        const XMLHTTPREQUEST = 1 << 4;
        const OTHER = 1 << 5;
        const WEBSOCKET = 1 << 6;
        const FONT = 1 << 7;
        const SUBDOCUMENT = 1 << 8;  // iframe/frame
        const OBJECT = 1 << 9;
        const OBJECT_SUBREQUEST = 1 << 10;
        const WEBRTC = 1 << 11;

        /// All content types
        const ALL = 0xFFF;
        /// Types that collapse into Safari's "raw" resource type
        const RAW = Self::XMLHTTPREQUEST.bits() | Self::OTHER.bits() | Self::WEBSOCKET.bits();
    }
}

// =============================================================================
// Rule Options (whitelist exception modifiers)
// =============================================================================

bitflags::bitflags! {
    /// Exception modifier bit mask ($elemhide, $urlblock, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RuleOption: u32 {
        /// $elemhide - disables element hiding rules
        const ELEMHIDE = 1 << 0;
        /// $generichide - disables generic element hiding rules
        const GENERICHIDE = 1 << 1;
        /// $genericblock - disables generic URL blocking rules
        const GENERICBLOCK = 1 << 2;
        /// $jsinject - disables javascript injection
        const JSINJECT = 1 << 3;
        /// $urlblock - disables URL blocking rules
        const URLBLOCK = 1 << 4;
        /// $content - disables content filtering rules
        const CONTENT = 1 << 5;

        /// $document - the document-level whitelist bundle
        const DOCUMENT = Self::ELEMHIDE.bits()
            | Self::JSINJECT.bits()
            | Self::URLBLOCK.bits()
            | Self::CONTENT.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_type() {
        let every = ContentType::IMAGE
            | ContentType::STYLESHEET
            | ContentType::SCRIPT
            | ContentType::MEDIA
            | ContentType::XMLHTTPREQUEST
            | ContentType::OTHER
            | ContentType::WEBSOCKET
            | ContentType::FONT
            | ContentType::SUBDOCUMENT
            | ContentType::OBJECT
            | ContentType::OBJECT_SUBREQUEST
            | ContentType::WEBRTC;
        assert_eq!(every, ContentType::ALL);
    }

    #[test]
    fn test_raw_bucket() {
        assert!(ContentType::RAW.contains(ContentType::XMLHTTPREQUEST));
        assert!(ContentType::RAW.contains(ContentType::OTHER));
        assert!(ContentType::RAW.contains(ContentType::WEBSOCKET));
        assert!(!ContentType::RAW.contains(ContentType::IMAGE));
    }

    #[test]
    fn test_document_bundle() {
        assert!(RuleOption::DOCUMENT.contains(RuleOption::ELEMHIDE));
        assert!(RuleOption::DOCUMENT.contains(RuleOption::URLBLOCK));
        assert!(RuleOption::DOCUMENT.contains(RuleOption::JSINJECT));
        assert!(RuleOption::DOCUMENT.contains(RuleOption::CONTENT));
        assert!(!RuleOption::DOCUMENT.contains(RuleOption::GENERICHIDE));
    }
}
