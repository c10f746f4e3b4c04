//! Trigger construction
//!
//! Builds the `trigger` half of an output entry: the url-filter regex,
//! the resource-type list, load-type, case sensitivity and domain
//! scoping.

use sb_core::domain::to_punycode;
use sb_core::entry::{LoadType, ResourceType, Trigger};
use sb_core::pattern::{pattern_to_regex, RegexConfig};
use sb_core::rule::UrlRule;
use sb_core::types::ContentType;

use crate::error::ConvertError;

/// Matches any http(s)/ws(s) URL. Kept intentionally simple: Safari
/// compiles every url-filter, and thousands of anchored scheme
/// alternations measurably slow extension reloads.
pub const URL_FILTER_ANY_URL: &str = "^[htpsw]+:\\/\\/";
/// Matches any websocket URL.
pub const URL_FILTER_WS_ANY_URL: &str = "^wss?:\\/\\/";
/// Fixed url-filter for CSS rules; required for acceptable matcher
/// performance.
pub const URL_FILTER_CSS_RULES: &str = ".*";

fn is_websocket_rule(rule: &UrlRule) -> bool {
    rule.permitted_content_type == ContentType::WEBSOCKET
}

fn any_url_filter(rule: &UrlRule) -> &'static str {
    if is_websocket_rule(rule) {
        URL_FILTER_WS_ANY_URL
    } else {
        URL_FILTER_ANY_URL
    }
}

/// Build the url-filter regex source for a URL rule.
pub fn build_url_filter(rule: &UrlRule, config: &RegexConfig) -> String {
    let text = rule.url_rule_text.as_str();
    if matches!(text, "" | "*" | "|*" | "||*") {
        return any_url_filter(rule).to_string();
    }

    if rule.is_regex_rule {
        if let Some(source) = &rule.regex_source {
            return source.clone();
        }
    }

    let source = pattern_to_regex(text, config);
    if source.is_empty() {
        return any_url_filter(rule).to_string();
    }
    if is_websocket_rule(rule) && !source.starts_with('^') && !source.starts_with("ws") {
        return format!("{URL_FILTER_WS_ANY_URL}.*{source}");
    }
    source
}

/// Map the permitted content-type mask onto Safari's resource types.
/// `None` means the key is omitted and the platform default applies.
pub fn build_resource_types(rule: &UrlRule) -> Option<Vec<ResourceType>> {
    if rule.permitted_content_type == ContentType::ALL
        && rule.restricted_content_type.is_empty()
    {
        return None;
    }

    let permitted = rule.permitted_content_type;
    let mut types = Vec::new();
    if permitted.intersects(ContentType::IMAGE) {
        types.push(ResourceType::Image);
    }
    if permitted.intersects(ContentType::STYLESHEET) {
        types.push(ResourceType::StyleSheet);
    }
    if permitted.intersects(ContentType::SCRIPT) {
        types.push(ResourceType::Script);
    }
    if permitted.intersects(ContentType::MEDIA) {
        types.push(ResourceType::Media);
    }
    if permitted.intersects(ContentType::RAW) {
        types.push(ResourceType::Raw);
    }
    if permitted.intersects(ContentType::FONT) {
        types.push(ResourceType::Font);
    }
    if permitted.intersects(ContentType::SUBDOCUMENT) {
        types.push(ResourceType::Document);
    }

    if rule.is_block_popups {
        types = vec![ResourceType::Popup];
    }

    if types.is_empty() {
        None
    } else {
        Some(types)
    }
}

pub fn build_load_type(rule: &UrlRule) -> Option<Vec<LoadType>> {
    if !rule.is_check_third_party {
        return None;
    }
    Some(vec![if rule.is_third_party {
        LoadType::ThirdParty
    } else {
        LoadType::FirstParty
    }])
}

/// Attach if-domain/unless-domain from the rule's domain lists.
/// Safari cannot express a trigger scoped both ways.
pub fn add_domain_options(
    trigger: &mut Trigger,
    permitted: &[String],
    restricted: &[String],
) -> Result<(), ConvertError> {
    let included = collect_domains(permitted);
    let excluded = collect_domains(restricted);

    if !included.is_empty() && !excluded.is_empty() {
        return Err(ConvertError::DomainScopeConflict);
    }
    if !included.is_empty() {
        trigger.if_domain = Some(included);
    } else if !excluded.is_empty() {
        trigger.unless_domain = Some(excluded);
    }
    Ok(())
}

fn collect_domains(domains: &[String]) -> Vec<String> {
    domains
        .iter()
        .map(|domain| domain.trim())
        .filter(|domain| !domain.is_empty())
        .map(to_punycode)
        .collect()
}
