//! Per-rule translation
//!
//! Turns one parsed rule into one output entry, or an error naming the
//! construct the target engine cannot express.

use log::warn;
use sb_core::domain::{is_valid_domain, to_punycode};
use sb_core::entry::{Action, ActionType, Entry, LoadType, ResourceType, Trigger};
use sb_core::pattern::RegexConfig;
use sb_core::rule::{CssRule, Rule, UrlRule};
use sb_core::types::{ContentType, RuleOption};

use crate::error::ConvertError;
use crate::trigger::{
    add_domain_options, build_load_type, build_resource_types, build_url_filter,
    URL_FILTER_ANY_URL, URL_FILTER_CSS_RULES,
};
use crate::validate::validate_url_filter;

/// Translate any rule kind. Script and scriptlet rules have no
/// counterpart in the target format.
pub fn translate_rule(rule: &Rule, config: &RegexConfig) -> Result<Entry, ConvertError> {
    match rule {
        Rule::Url(rule) => translate_url(rule, config),
        Rule::Css(rule) => translate_css(rule),
        Rule::Script(_) => Err(ConvertError::Unsupported(
            "script injection rules are not supported",
        )),
        Rule::Scriptlet(_) => Err(ConvertError::Unsupported(
            "scriptlet rules are not supported",
        )),
    }
}

/// Translate an element hiding rule into a css-display-none entry.
pub fn translate_css(rule: &CssRule) -> Result<Entry, ConvertError> {
    if rule.is_inject_rule {
        return Err(ConvertError::Unsupported(
            "CSS injection rules are not supported",
        ));
    }
    if rule.extended_css {
        return Err(ConvertError::Unsupported(
            "extended CSS rules are not supported",
        ));
    }

    let mut trigger = Trigger {
        url_filter: URL_FILTER_CSS_RULES.to_string(),
        ..Trigger::default()
    };
    add_domain_options(&mut trigger, &rule.permitted_domains, &rule.restricted_domains)?;

    // Exceptions keep their selector: the exception applier joins hide
    // and exception entries by selector identity.
    let mut action = Action::css_display_none(rule.css_selector.clone());
    if rule.is_white_list {
        action.action_type = ActionType::IgnorePreviousRules;
    }

    Ok(Entry { trigger, action })
}

/// Translate a URL rule into a block or ignore-previous-rules entry.
pub fn translate_url(rule: &UrlRule, config: &RegexConfig) -> Result<Entry, ConvertError> {
    if rule.is_csp {
        return Err(ConvertError::Unsupported("$csp rules are not supported"));
    }
    if rule.replace.is_some() {
        return Err(ConvertError::Unsupported("$replace rules are not supported"));
    }
    if rule.permitted_content_type == ContentType::OBJECT
        || rule.permitted_content_type == ContentType::OBJECT_SUBREQUEST
        || rule.permitted_content_type == ContentType::WEBRTC
    {
        return Err(ConvertError::Unsupported(
            "$object, $object-subrequest and $webrtc rules are not supported",
        ));
    }
    if rule.is_single_option(RuleOption::JSINJECT) {
        return Err(ConvertError::Unsupported(
            "$jsinject rules are not supported",
        ));
    }

    let url_filter = build_url_filter(rule, config);
    validate_url_filter(&url_filter)?;

    let mut trigger = Trigger {
        url_filter,
        ..Trigger::default()
    };

    let mut action = Action::block();
    if rule.is_white_list {
        action.action_type = ActionType::IgnorePreviousRules;
    }

    trigger.resource_type = build_resource_types(rule);
    trigger.load_type = build_load_type(rule);
    if rule.is_match_case {
        trigger.url_filter_is_case_sensitive = Some(true);
    }
    add_domain_options(&mut trigger, &rule.permitted_domains, &rule.restricted_domains)?;

    let mut entry = Entry { trigger, action };
    check_white_list_exceptions(rule, &mut entry);
    validate_url_blocking_rule(&entry)?;
    Ok(entry)
}

/// Rewrite document-level and option-scoped whitelist rules into
/// domain-wide exceptions: the whole point of `@@...$document` is "turn
/// everything off on this site", which Safari expresses as an any-URL
/// ignore entry scoped by if-domain.
fn check_white_list_exceptions(rule: &UrlRule, entry: &mut Entry) {
    if !rule.is_white_list {
        return;
    }

    let document_white_list = rule.is_document_white_list();
    let url_block_exception = rule.is_single_option(RuleOption::URLBLOCK)
        || rule.is_single_option(RuleOption::GENERICBLOCK);
    let css_exception = rule.is_single_option(RuleOption::GENERICHIDE)
        || rule.is_single_option(RuleOption::ELEMHIDE);

    if !(document_white_list || url_block_exception || css_exception) {
        return;
    }

    if document_white_list {
        entry.trigger.resource_type = None;
    }

    // An explicit $domain= scope takes priority over anything derived
    // from the URL pattern. The if-domain list already carries it,
    // parsed and punycoded.
    if !rule.permitted_domains.is_empty() {
        entry.trigger.unless_domain = None;
        entry.trigger.url_filter = URL_FILTER_ANY_URL.to_string();
        entry.trigger.resource_type = None;
        return;
    }

    let parsed = match parse_rule_domain(&rule.url_rule_text) {
        Some(parsed) => parsed,
        None => {
            warn!(
                "Whitelist rule \"{}\" has no parseable domain, url filter is left in place",
                rule.rule_text
            );
            return;
        }
    };

    if let Some(path) = &parsed.path {
        if path != "^" && path != "/" {
            warn!(
                "Whitelist rule \"{}\" has a path, url filter is left in place",
                rule.rule_text
            );
            return;
        }
    }

    entry.trigger.if_domain = Some(vec![parsed.domain]);
    entry.trigger.unless_domain = None;
    entry.trigger.url_filter = URL_FILTER_ANY_URL.to_string();
    entry.trigger.resource_type = None;
}

/// Document-blocking entries must be scoped: an unscoped one would stop
/// every navigation in the browser.
fn validate_url_blocking_rule(entry: &Entry) -> Result<(), ConvertError> {
    if entry.action.action_type != ActionType::Block {
        return Ok(());
    }
    let has_document = entry
        .trigger
        .resource_type
        .as_ref()
        .is_some_and(|types| types.contains(&ResourceType::Document));
    if !has_document {
        return Ok(());
    }

    let has_if_domain = entry
        .trigger
        .if_domain
        .as_ref()
        .is_some_and(|domains| !domains.is_empty());
    let has_third_party = entry
        .trigger
        .load_type
        .as_ref()
        .is_some_and(|load| load.contains(&LoadType::ThirdParty));

    if has_if_domain || has_third_party {
        Ok(())
    } else {
        Err(ConvertError::DocumentBlockPolicy)
    }
}

pub(crate) struct ParsedDomain {
    pub domain: String,
    pub path: Option<String>,
}

const DOMAIN_PREFIXES: [&str; 6] = [
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "||",
    "//",
];

/// Extract the domain a rule pattern is scoped to, together with any
/// path remainder after the first `/` or `^`.
pub(crate) fn parse_rule_domain(text: &str) -> Option<ParsedDomain> {
    let mut start = 0;
    for prefix in DOMAIN_PREFIXES {
        if text.starts_with(prefix) {
            start = prefix.len();
            break;
        }
    }

    let rest = &text[start..];
    let (domain, path) = match rest.find(['/', '^']) {
        Some(index) => (&rest[..index], Some(rest[index..].to_string())),
        None => (rest, None),
    };

    if !is_valid_domain(domain) {
        return None;
    }

    Some(ParsedDomain {
        domain: to_punycode(domain),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::create_rule;

    fn config() -> RegexConfig {
        RegexConfig::content_blocker()
    }

    fn translate(line: &str) -> Result<Entry, ConvertError> {
        let rule = create_rule(line).unwrap().unwrap();
        translate_rule(&rule, &config())
    }

    #[test]
    fn test_block_rule() {
        let entry = translate("||example.com^").unwrap();
        assert_eq!(entry.action.action_type, ActionType::Block);
        assert!(entry
            .trigger
            .url_filter
            .starts_with("^[htpsw]+:\\/\\/([a-z0-9-]+\\.)?example\\.com"));
        assert_eq!(entry.trigger.resource_type, None);
    }

    #[test]
    fn test_css_rule() {
        let entry = translate("example.com##.ad").unwrap();
        assert_eq!(entry.trigger.url_filter, ".*");
        assert_eq!(entry.action.action_type, ActionType::CssDisplayNone);
        assert_eq!(entry.action.selector.as_deref(), Some(".ad"));
        assert_eq!(
            entry.trigger.if_domain,
            Some(vec!["example.com".to_string()])
        );
    }

    #[test]
    fn test_css_exception_keeps_selector() {
        let entry = translate("example.com#@#.ad").unwrap();
        assert_eq!(entry.action.action_type, ActionType::IgnorePreviousRules);
        assert_eq!(entry.action.selector.as_deref(), Some(".ad"));
    }

    #[test]
    fn test_inject_and_extended_css_rejected() {
        assert!(translate("example.com#$#.ad { display: none!important; }").is_err());
        assert!(translate("example.com#?#.ad:-abp-has(a)").is_err());
    }

    #[test]
    fn test_unsupported_url_constructs() {
        assert!(translate("||example.com^$csp=script-src 'none'").is_err());
        assert!(translate("||example.com^$replace=/ads/_/").is_err());
        assert!(translate("||example.com^$object").is_err());
        assert!(translate("||example.com^$webrtc").is_err());
        assert!(translate("@@||example.com^$jsinject").is_err());
        assert!(translate("example.com#%#window.ads = false;").is_err());
    }

    #[test]
    fn test_match_case_and_third_party() {
        let entry = translate("||example.com^$match-case,third-party").unwrap();
        assert_eq!(entry.trigger.url_filter_is_case_sensitive, Some(true));
        assert_eq!(entry.trigger.load_type, Some(vec![LoadType::ThirdParty]));
    }

    #[test]
    fn test_regex_rejection_propagates() {
        let err = translate("/foo{1,3}bar/").unwrap_err();
        assert!(err.to_string().contains("{digit}"));
    }

    #[test]
    fn test_document_whitelist_rewrite() {
        let entry = translate("@@||example.com^$document").unwrap();
        assert_eq!(entry.action.action_type, ActionType::IgnorePreviousRules);
        assert_eq!(entry.trigger.url_filter, URL_FILTER_ANY_URL);
        assert_eq!(
            entry.trigger.if_domain,
            Some(vec!["example.com".to_string()])
        );
        assert_eq!(entry.trigger.resource_type, None);
    }

    #[test]
    fn test_whitelist_with_path_is_left_in_place() {
        let entry = translate("@@||example.com/page$document").unwrap();
        assert_eq!(entry.trigger.if_domain, None);
        assert_ne!(entry.trigger.url_filter, URL_FILTER_ANY_URL);
    }

    #[test]
    fn test_generichide_rewrite() {
        let entry = translate("@@||example.com^$generichide").unwrap();
        assert_eq!(entry.action.action_type, ActionType::IgnorePreviousRules);
        assert_eq!(
            entry.trigger.if_domain,
            Some(vec!["example.com".to_string()])
        );
    }

    #[test]
    fn test_document_block_requires_scope() {
        assert!(matches!(
            translate("||example.com^$subdocument"),
            Err(ConvertError::DocumentBlockPolicy)
        ));
        assert!(translate("||example.com^$subdocument,third-party").is_ok());
        assert!(translate("||example.com^$subdocument,domain=example.org").is_ok());
    }

    #[test]
    fn test_parse_rule_domain() {
        let parsed = parse_rule_domain("||example.com^").unwrap();
        assert_eq!(parsed.domain, "example.com");
        assert_eq!(parsed.path.as_deref(), Some("^"));

        let parsed = parse_rule_domain("https://www.example.com/page").unwrap();
        assert_eq!(parsed.domain, "example.com");
        assert_eq!(parsed.path.as_deref(), Some("/page"));

        let parsed = parse_rule_domain("||example.com").unwrap();
        assert_eq!(parsed.domain, "example.com");
        assert_eq!(parsed.path, None);

        assert!(parse_rule_domain("||ads").is_none());
        assert!(parse_rule_domain("banner*").is_none());
    }

    #[test]
    fn test_domain_modifier_takes_priority_over_pattern() {
        let entry = translate("@@||amazon.com^$document,domain=partner.com").unwrap();
        assert_eq!(entry.action.action_type, ActionType::IgnorePreviousRules);
        assert_eq!(
            entry.trigger.if_domain,
            Some(vec!["partner.com".to_string()])
        );
        assert_eq!(entry.trigger.url_filter, URL_FILTER_ANY_URL);
        assert_eq!(entry.trigger.resource_type, None);
    }

    #[test]
    fn test_domain_modifier_without_pattern() {
        let entry = translate("@@$document,domain=example.com").unwrap();
        assert_eq!(
            entry.trigger.if_domain,
            Some(vec!["example.com".to_string()])
        );
        assert_eq!(entry.trigger.url_filter, URL_FILTER_ANY_URL);
    }
}
