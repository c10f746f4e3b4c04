//! Generic CSS rule compaction
//!
//! Splits css-display-none entries by domain scope and merges the
//! un-scoped ("wide") ones by comma-joining their selectors, so a list
//! with tens of thousands of generic hides produces a few hundred
//! entries instead.

use sb_core::entry::{Action, Entry, Trigger};

use crate::trigger::URL_FILTER_CSS_RULES;

/// Maximum selectors merged into one wide entry. Bounded by the cost of
/// Safari's selector compiler on pathological lists.
pub const SELECTORS_PER_WIDE_RULE: usize = 250;

#[derive(Debug, Default)]
pub struct CompactedCss {
    pub wide: Vec<Entry>,
    pub generic_domain_sensitive: Vec<Entry>,
    pub domain_sensitive: Vec<Entry>,
}

/// Partition hide entries by scope and batch the wide ones.
pub fn compact_css(rules: Vec<Entry>) -> CompactedCss {
    let mut compacted = CompactedCss::default();
    let mut wide_selectors = Vec::new();

    for entry in rules {
        let has_if = entry
            .trigger
            .if_domain
            .as_ref()
            .is_some_and(|domains| !domains.is_empty());
        let has_unless = entry
            .trigger
            .unless_domain
            .as_ref()
            .is_some_and(|domains| !domains.is_empty());

        if has_if {
            compacted.domain_sensitive.push(entry);
        } else if has_unless {
            compacted.generic_domain_sensitive.push(entry);
        } else if let Some(selector) = entry.action.selector {
            wide_selectors.push(selector);
        }
    }

    for batch in wide_selectors.chunks(SELECTORS_PER_WIDE_RULE) {
        compacted.wide.push(Entry {
            trigger: Trigger {
                url_filter: URL_FILTER_CSS_RULES.to_string(),
                ..Trigger::default()
            },
            action: Action::css_display_none(batch.join(", ")),
        });
    }

    compacted
}
