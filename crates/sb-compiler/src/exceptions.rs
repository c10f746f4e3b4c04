//! CSS exception application
//!
//! Joins css-display-none entries with ignore-previous-rules entries by
//! selector identity and moves the exception's if-domain hosts into the
//! hide entry's unless-domain.

use std::collections::HashMap;

use log::warn;
use sb_core::entry::Entry;

use crate::error::ConvertError;

/// Apply CSS exceptions to hide entries. Entries left scoped both ways
/// cannot be expressed and are dropped with an error.
pub fn apply_css_exceptions(
    mut rules: Vec<Entry>,
    exceptions: &[Entry],
    errors: &mut Vec<String>,
) -> Vec<Entry> {
    if exceptions.is_empty() {
        return rules;
    }

    let mut rules_map: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, entry) in rules.iter().enumerate() {
        if let Some(selector) = &entry.action.selector {
            rules_map.entry(selector.clone()).or_default().push(index);
        }
    }

    for exception in exceptions {
        let Some(selector) = &exception.action.selector else {
            continue;
        };
        let Some(indices) = rules_map.get(selector) else {
            continue;
        };
        let Some(domains) = &exception.trigger.if_domain else {
            continue;
        };
        for &index in indices {
            for domain in domains {
                push_exception_domain(domain, &mut rules[index]);
            }
        }
    }

    rules.retain(|entry| {
        if entry.trigger.has_conflicting_domains() {
            let selector = entry.action.selector.as_deref().unwrap_or_default();
            warn!("Dropping hide rule for selector \"{selector}\": scoped both ways after exception application");
            errors.push(format!(
                "Unable to keep rule with selector \"{}\": {}",
                selector,
                ConvertError::ExceptionApplicationDropped
            ));
            false
        } else {
            true
        }
    });

    rules
}

/// The exception domain applies to a scoped hide entry only when one of
/// the permitted domains is a substring of it. The direction of this
/// test is deliberate: it approximates "the exception falls within the
/// permitted scope".
fn push_exception_domain(domain: &str, entry: &mut Entry) {
    if domain.is_empty() {
        return;
    }

    if let Some(permitted) = &entry.trigger.if_domain {
        if !permitted.is_empty() && !permitted.iter().any(|p| domain.contains(p.as_str())) {
            return;
        }
    }

    entry
        .trigger
        .unless_domain
        .get_or_insert_with(Vec::new)
        .push(domain.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_core::entry::{Action, ActionType, Trigger};

    fn hide(selector: &str, if_domain: Option<Vec<&str>>) -> Entry {
        Entry {
            trigger: Trigger {
                url_filter: ".*".to_string(),
                if_domain: if_domain
                    .map(|domains| domains.into_iter().map(str::to_string).collect()),
                ..Trigger::default()
            },
            action: Action::css_display_none(selector.to_string()),
        }
    }

    fn exception(selector: &str, if_domain: Vec<&str>) -> Entry {
        let mut entry = hide(selector, Some(if_domain));
        entry.action.action_type = ActionType::IgnorePreviousRules;
        entry
    }

    #[test]
    fn test_exception_moves_domain_to_unless() {
        let rules = vec![hide(".ad", None)];
        let exceptions = vec![exception(".ad", vec!["example.com"])];
        let mut errors = Vec::new();

        let result = apply_css_exceptions(rules, &exceptions, &mut errors);
        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].trigger.unless_domain,
            Some(vec!["example.com".to_string()])
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_selector_mismatch_is_ignored() {
        let rules = vec![hide(".ad", None)];
        let exceptions = vec![exception(".banner", vec!["example.com"])];
        let mut errors = Vec::new();

        let result = apply_css_exceptions(rules, &exceptions, &mut errors);
        assert_eq!(result[0].trigger.unless_domain, None);
    }

    #[test]
    fn test_scoped_hide_applicability() {
        // Exception on a subdomain of the permitted scope applies
        let rules = vec![hide(".ad", Some(vec!["example.com"]))];
        let exceptions = vec![exception(".ad", vec!["sub.example.com"])];
        let mut errors = Vec::new();
        let result = apply_css_exceptions(rules, &exceptions, &mut errors);
        // Entry became scoped both ways and is dropped
        assert!(result.is_empty());
        assert_eq!(errors.len(), 1);

        // Unrelated exception domain does not apply
        let rules = vec![hide(".ad", Some(vec!["example.com"]))];
        let exceptions = vec![exception(".ad", vec!["other.org"])];
        let mut errors = Vec::new();
        let result = apply_css_exceptions(rules, &exceptions, &mut errors);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trigger.unless_domain, None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_multiple_exceptions_accumulate() {
        let rules = vec![hide(".ad", None)];
        let exceptions = vec![
            exception(".ad", vec!["a.com"]),
            exception(".ad", vec!["b.com"]),
        ];
        let mut errors = Vec::new();
        let result = apply_css_exceptions(rules, &exceptions, &mut errors);
        assert_eq!(
            result[0].trigger.unless_domain,
            Some(vec!["a.com".to_string(), "b.com".to_string()])
        );
    }
}
