//! Finalization
//!
//! Concatenates the category buckets in precedence order, wildcards the
//! domain lists, enforces the total-rule cap and serializes to JSON.

use log::warn;
use sb_core::entry::{Entry, Trigger};
use serde::Serialize;

use crate::error::ConvertError;
use crate::pipeline::{ContentBlockerBuckets, ConversionResult};

/// Produce the final conversion result from filled buckets.
pub fn finalize(buckets: ContentBlockerBuckets, limit: usize) -> ConversionResult {
    let ContentBlockerBuckets {
        css_blocking_wide,
        css_blocking_generic_domain_sensitive,
        css_blocking_generic_hide_exceptions,
        css_blocking_domain_sensitive,
        css_elemhide,
        url_blocking,
        other,
        important,
        important_exceptions,
        document_exceptions,
        mut errors,
    } = buckets;

    // Category order is rule precedence; do not reorder.
    let mut entries = Vec::new();
    for bucket in [
        css_blocking_wide,
        css_blocking_generic_domain_sensitive,
        css_blocking_generic_hide_exceptions,
        css_blocking_domain_sensitive,
        css_elemhide,
        url_blocking,
        other,
        important,
        important_exceptions,
        document_exceptions,
    ] {
        entries.extend(bucket);
    }

    entries.retain(|entry| {
        if entry.trigger.has_conflicting_domains() {
            warn!(
                "Dropping entry with url-filter \"{}\": both if-domain and unless-domain set",
                entry.trigger.url_filter
            );
            errors.push(format!(
                "Unable to keep entry with url-filter \"{}\": {}",
                entry.trigger.url_filter,
                ConvertError::ExceptionApplicationDropped
            ));
            false
        } else {
            true
        }
    });

    for entry in &mut entries {
        apply_domain_wildcards(&mut entry.trigger);
    }

    let total_converted_count = entries.len();
    let mut over_limit = false;
    if limit > 0 && entries.len() > limit {
        over_limit = true;
        let message = ConvertError::LimitExceeded(limit).to_string();
        warn!("{message}");
        errors.push(message);
        entries.truncate(limit);
    }

    let converted = serialize_entries(&entries);

    ConversionResult {
        total_converted_count,
        converted_count: entries.len(),
        errors_count: errors.len(),
        over_limit,
        converted,
        errors,
    }
}

/// Safari matches `if-domain`/`unless-domain` entries exactly unless
/// they start with `*`, which extends the match to subdomains.
fn apply_domain_wildcards(trigger: &mut Trigger) {
    let wildcard = |domains: &mut Option<Vec<String>>| {
        if let Some(domains) = domains {
            for domain in domains {
                domain.insert(0, '*');
            }
        }
    };
    wildcard(&mut trigger.if_domain);
    wildcard(&mut trigger.unless_domain);
}

/// Serialize with tab indentation, matching the target consumer's
/// expected layout.
fn serialize_entries(entries: &[Entry]) -> String {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    if entries.serialize(&mut serializer).is_err() {
        return "[]".to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| "[]".to_string())
}
