use sb_core::rule::{CssRule, Rule, ScriptRule, ScriptletRule, UrlRule};
use sb_core::types::{ContentType, RuleOption};

use crate::error::ConvertError;

pub const MASK_WHITE_LIST: &str = "@@";

const MASK_SCRIPT_RULE: &str = "#%#";
const MASK_SCRIPT_EXCEPTION_RULE: &str = "#@%#";
const MASK_SCRIPTLET: &str = "//scriptlet(";
const MASK_CONTENT_RULE: &str = "$$";
const MASK_CONTENT_EXCEPTION_RULE: &str = "$@$";
const MASK_UBO_HTML_FILTER: &str = "##^";
const MASK_UBO_SCRIPTLET: &str = "##+js(";
const MASK_UBO_SCRIPTLET_EXCEPTION: &str = "#@#+js(";

struct CssMark {
    mask: &'static str,
    white_list: bool,
    extended: bool,
    inject: bool,
}

/// Longest marks first so compound marks win over their prefixes.
const CSS_MARKS: &[CssMark] = &[
    CssMark { mask: "#@$?#", white_list: true, extended: true, inject: true },
    CssMark { mask: "#$?#", white_list: false, extended: true, inject: true },
    CssMark { mask: "#@?#", white_list: true, extended: true, inject: false },
    CssMark { mask: "#@$#", white_list: true, extended: false, inject: true },
    CssMark { mask: "#?#", white_list: false, extended: true, inject: false },
    CssMark { mask: "#$#", white_list: false, extended: false, inject: true },
    CssMark { mask: "#@#", white_list: true, extended: false, inject: false },
    CssMark { mask: "##", white_list: false, extended: false, inject: false },
];

/// Parse one filter list line into a rule.
///
/// Returns `Ok(None)` for lines that carry no rule at all: blank lines,
/// comments, metadata headers and masks the builder does not support.
/// Lines that look like rules but cannot be parsed are errors.
pub fn create_rule(line: &str) -> Result<Option<Rule>, ConvertError> {
    if line.starts_with(' ') {
        return Ok(None);
    }

    let line = line.trim_end();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('!') || line.starts_with('[') {
        return Ok(None);
    }
    if line.contains(" - ") {
        return Ok(None);
    }
    if line.contains(MASK_UBO_HTML_FILTER) {
        return Ok(None);
    }
    if line.contains(MASK_CONTENT_RULE) || line.contains(MASK_CONTENT_EXCEPTION_RULE) {
        return Ok(None);
    }

    if let Some(rule) = create_script_rule(line) {
        return Ok(Some(rule));
    }
    if let Some(rule) = create_ubo_scriptlet_rule(line) {
        return Ok(Some(rule));
    }
    if let Some((index, mark)) = find_css_mark(line) {
        return create_css_rule(line, index, mark).map(Some);
    }

    create_url_rule(line).map(Some)
}

fn find_css_mark(line: &str) -> Option<(usize, &'static CssMark)> {
    let mut best: Option<(usize, &CssMark)> = None;
    for mark in CSS_MARKS {
        if let Some(index) = line.find(mark.mask) {
            match best {
                Some((best_index, _)) if best_index <= index => {}
                _ => best = Some((index, mark)),
            }
        }
    }
    best
}

fn create_css_rule(
    line: &str,
    index: usize,
    mark: &CssMark,
) -> Result<Rule, ConvertError> {
    let selector = line[index + mark.mask.len()..].trim();
    if selector.is_empty() {
        return Err(ConvertError::Parse("empty selector".to_string()));
    }

    let (permitted_domains, restricted_domains) = parse_domains_list(&line[..index], ',');

    Ok(Rule::Css(CssRule {
        rule_text: line.to_string(),
        converted_rule_text: line.to_string(),
        css_selector: selector.to_string(),
        is_inject_rule: mark.inject,
        extended_css: mark.extended,
        is_white_list: mark.white_list,
        permitted_domains,
        restricted_domains,
    }))
}

fn create_script_rule(line: &str) -> Option<Rule> {
    if let Some(index) = line.find(MASK_SCRIPT_EXCEPTION_RULE) {
        let script = line[index + MASK_SCRIPT_EXCEPTION_RULE.len()..].trim();
        return Some(Rule::Script(ScriptRule {
            rule_text: line.to_string(),
            converted_rule_text: line.to_string(),
            script: script.to_string(),
            is_white_list: true,
        }));
    }

    let index = line.find(MASK_SCRIPT_RULE)?;
    let payload = line[index + MASK_SCRIPT_RULE.len()..].trim();
    if payload.starts_with(MASK_SCRIPTLET) {
        return Some(Rule::Scriptlet(ScriptletRule {
            rule_text: line.to_string(),
            converted_rule_text: line.to_string(),
            payload: payload.to_string(),
            is_white_list: false,
        }));
    }
    Some(Rule::Script(ScriptRule {
        rule_text: line.to_string(),
        converted_rule_text: line.to_string(),
        script: payload.to_string(),
        is_white_list: false,
    }))
}

/// uBO scriptlet dialect: `example.com##+js(name, args)`. Normalized to
/// the `#%#//scriptlet(...)` form before being wrapped.
fn create_ubo_scriptlet_rule(line: &str) -> Option<Rule> {
    for (mask, white_list) in [
        (MASK_UBO_SCRIPTLET_EXCEPTION, true),
        (MASK_UBO_SCRIPTLET, false),
    ] {
        if let Some(index) = line.find(mask) {
            let domains = &line[..index];
            let body = line[index + mask.len()..].trim_end_matches(')');
            let payload = format!("//scriptlet({body})");
            let converted = format!("{domains}{MASK_SCRIPT_RULE}{payload}");
            return Some(Rule::Scriptlet(ScriptletRule {
                rule_text: line.to_string(),
                converted_rule_text: converted,
                payload,
                is_white_list: white_list,
            }));
        }
    }
    None
}

fn create_url_rule(line: &str) -> Result<Rule, ConvertError> {
    let mut rule = UrlRule {
        rule_text: line.to_string(),
        converted_rule_text: line.to_string(),
        ..UrlRule::default()
    };

    let mut text = line;
    if let Some(rest) = text.strip_prefix(MASK_WHITE_LIST) {
        rule.is_white_list = true;
        text = rest;
    }

    // Whole-line regex rules carry no options; `/.../$options` splits
    // like any other rule
    let (pattern, options_text) = if is_regex_pattern(text) {
        (text, None)
    } else {
        split_rule_options(text)
    };
    rule.url_rule_text = pattern.to_string();
    if is_regex_pattern(pattern) {
        rule.is_regex_rule = true;
        rule.regex_source = Some(pattern[1..pattern.len() - 1].to_string());
    }

    if let Some(options_text) = options_text {
        let kept = parse_url_options(&mut rule, options_text)?;
        if rule.is_bad_filter {
            rule.bad_filter = Some(rebuild_rule_text(rule.is_white_list, pattern, &kept));
        }
    }

    Ok(Rule::Url(rule))
}

fn is_regex_pattern(text: &str) -> bool {
    text.len() > 1 && text.starts_with('/') && text.ends_with('/')
}

/// Options start at the last unescaped `$`. A trailing `$` is part of
/// the pattern.
fn split_rule_options(text: &str) -> (&str, Option<&str>) {
    let bytes = text.as_bytes();
    for i in (0..bytes.len()).rev() {
        if bytes[i] == b'$' && (i == 0 || bytes[i - 1] != b'\\') {
            if i + 1 < text.len() {
                return (&text[..i], Some(&text[i + 1..]));
            }
            return (text, None);
        }
    }
    (text, None)
}

/// Split an options list on commas, honoring `\,` escapes inside values.
fn split_options(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        if bytes[i] == b',' && (i == 0 || bytes[i - 1] != b'\\') {
            parts.push(&text[start..i]);
            start = i + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parse the `$options` tail into the rule. Returns the option segments
/// kept for `$badfilter` text reconstruction.
fn parse_url_options<'a>(
    rule: &mut UrlRule,
    options_text: &'a str,
) -> Result<Vec<&'a str>, ConvertError> {
    let mut include = ContentType::empty();
    let mut exclude = ContentType::empty();
    let mut kept = Vec::new();

    for raw in split_options(options_text) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let (negated, body) = match raw.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let (name_raw, value) = match body.find('=') {
            Some(i) => (&body[..i], Some(&body[i + 1..])),
            None => (body, None),
        };
        let name = name_raw.to_ascii_lowercase();
        let name = name.as_str();

        if negated && value.is_some() {
            return Err(ConvertError::Parse(format!(
                "negated valued option: {name_raw}"
            )));
        }

        match (name, value) {
            ("domain", Some(value)) => {
                let (permitted, restricted) = parse_domains_list(value, '|');
                if permitted.is_empty() && restricted.is_empty() {
                    return Err(ConvertError::Parse("empty domain modifier".to_string()));
                }
                rule.permitted_domains.extend(permitted);
                rule.restricted_domains.extend(restricted);
            }
            ("csp", _) => rule.is_csp = true,
            ("replace", _) => rule.replace = Some(value.unwrap_or("").to_string()),
            ("third-party" | "thirdparty" | "3p", None) => {
                rule.is_check_third_party = true;
                rule.is_third_party = !negated;
            }
            ("first-party" | "firstparty" | "1p", None) => {
                rule.is_check_third_party = true;
                rule.is_third_party = negated;
            }
            ("match-case", None) => rule.is_match_case = !negated,
            ("important", None) if !negated => rule.is_important = true,
            ("badfilter", None) if !negated => {
                rule.is_bad_filter = true;
                continue;
            }
            ("popup", None) if !negated => {
                rule.is_block_popups = true;
                include |= ContentType::SUBDOCUMENT;
            }
            _ => {
                if let Some(option) = white_list_option(name) {
                    if negated {
                        return Err(ConvertError::Parse(format!(
                            "negated option: {name_raw}"
                        )));
                    }
                    if !rule.is_white_list {
                        return Err(ConvertError::Parse(format!(
                            "{name_raw} modifier is allowed only in whitelist rules"
                        )));
                    }
                    rule.enabled_options |= option;
                } else if let Some(mask) = content_type_mask(name) {
                    if negated {
                        exclude |= mask;
                    } else {
                        include |= mask;
                    }
                } else {
                    return Err(ConvertError::Parse(format!(
                        "unknown rule option: {name_raw}"
                    )));
                }
            }
        }

        kept.push(raw);
    }

    let permitted = if include.is_empty() {
        ContentType::ALL
    } else {
        include
    };
    rule.permitted_content_type = permitted.difference(exclude);
    rule.restricted_content_type = exclude;
    if rule.permitted_content_type.is_empty() {
        return Err(ConvertError::Parse(
            "contradictory content type modifiers".to_string(),
        ));
    }

    Ok(kept)
}

fn rebuild_rule_text(white_list: bool, pattern: &str, options: &[&str]) -> String {
    let prefix = if white_list { MASK_WHITE_LIST } else { "" };
    if options.is_empty() {
        format!("{prefix}{pattern}")
    } else {
        format!("{prefix}{pattern}${}", options.join(","))
    }
}

fn parse_domains_list(text: &str, separator: char) -> (Vec<String>, Vec<String>) {
    let mut permitted = Vec::new();
    let mut restricted = Vec::new();

    for raw in text.split(separator) {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.strip_prefix('~') {
            Some(rest) => {
                let rest = rest.trim();
                if !rest.is_empty() {
                    restricted.push(rest.to_string());
                }
            }
            None => permitted.push(raw.to_string()),
        }
    }

    (permitted, restricted)
}

fn white_list_option(name: &str) -> Option<RuleOption> {
    match name {
        "elemhide" | "ehide" => Some(RuleOption::ELEMHIDE),
        "generichide" | "ghide" => Some(RuleOption::GENERICHIDE),
        "genericblock" => Some(RuleOption::GENERICBLOCK),
        "jsinject" => Some(RuleOption::JSINJECT),
        "urlblock" => Some(RuleOption::URLBLOCK),
        "content" => Some(RuleOption::CONTENT),
        "document" | "doc" => Some(RuleOption::DOCUMENT),
        _ => None,
    }
}

fn content_type_mask(name: &str) -> Option<ContentType> {
    match name {
        "image" => Some(ContentType::IMAGE),
        "stylesheet" | "css" => Some(ContentType::STYLESHEET),
        "script" => Some(ContentType::SCRIPT),
        "media" => Some(ContentType::MEDIA),
        "xmlhttprequest" | "xhr" => Some(ContentType::XMLHTTPREQUEST),
        "other" => Some(ContentType::OTHER),
        "websocket" => Some(ContentType::WEBSOCKET),
        "font" => Some(ContentType::FONT),
        "subdocument" | "frame" => Some(ContentType::SUBDOCUMENT),
        "object" => Some(ContentType::OBJECT),
        "object-subrequest" | "object_subrequest" => Some(ContentType::OBJECT_SUBREQUEST),
        "webrtc" => Some(ContentType::WEBRTC),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(line: &str) -> UrlRule {
        match create_rule(line).unwrap().unwrap() {
            Rule::Url(rule) => rule,
            other => panic!("expected url rule, got {other:?}"),
        }
    }

    fn css(line: &str) -> CssRule {
        match create_rule(line).unwrap().unwrap() {
            Rule::Css(rule) => rule,
            other => panic!("expected css rule, got {other:?}"),
        }
    }

    #[test]
    fn test_skips_comments_and_blanks() {
        assert!(create_rule("").unwrap().is_none());
        assert!(create_rule("   ").unwrap().is_none());
        assert!(create_rule("! comment").unwrap().is_none());
        assert!(create_rule("[Adblock Plus 2.0]").unwrap().is_none());
        assert!(create_rule(" indented").unwrap().is_none());
        assert!(create_rule("some - text").unwrap().is_none());
    }

    #[test]
    fn test_skips_unsupported_masks() {
        assert!(create_rule("example.com##^script:has-text(ads)").unwrap().is_none());
        assert!(create_rule("example.com$$script[data-src=\"banner\"]").unwrap().is_none());
        assert!(create_rule("example.com$@$script[data-src=\"banner\"]").unwrap().is_none());
    }

    #[test]
    fn test_basic_url_rule() {
        let rule = url("||example.com^");
        assert_eq!(rule.url_rule_text, "||example.com^");
        assert!(!rule.is_white_list);
        assert!(!rule.is_regex_rule);
        assert_eq!(rule.permitted_content_type, ContentType::ALL);
    }

    #[test]
    fn test_whitelist_url_rule() {
        let rule = url("@@||example.com^$document");
        assert!(rule.is_white_list);
        assert_eq!(rule.enabled_options, RuleOption::DOCUMENT);
        assert!(rule.is_document_white_list());
    }

    #[test]
    fn test_regex_rule_keeps_source() {
        let rule = url("/banner[0-9]+/");
        assert!(rule.is_regex_rule);
        assert_eq!(rule.regex_source.as_deref(), Some("banner[0-9]+"));
    }

    #[test]
    fn test_regex_rule_with_options() {
        let rule = url("/banner\\d+/$important");
        assert!(rule.is_regex_rule);
        assert_eq!(rule.regex_source.as_deref(), Some("banner\\d+"));
        assert!(rule.is_important);
    }

    #[test]
    fn test_regex_rule_with_inner_dollar() {
        let rule = url("/ads$/");
        assert!(rule.is_regex_rule);
        assert_eq!(rule.regex_source.as_deref(), Some("ads$"));
    }

    #[test]
    fn test_content_type_options() {
        let rule = url("||example.com^$image,script");
        assert_eq!(
            rule.permitted_content_type,
            ContentType::IMAGE | ContentType::SCRIPT
        );

        let rule = url("||example.com^$~image");
        assert!(!rule.permitted_content_type.contains(ContentType::IMAGE));
        assert!(rule.permitted_content_type.contains(ContentType::SCRIPT));
        assert_eq!(rule.restricted_content_type, ContentType::IMAGE);
    }

    #[test]
    fn test_third_party_options() {
        let rule = url("||example.com^$third-party");
        assert!(rule.is_check_third_party);
        assert!(rule.is_third_party);

        let rule = url("||example.com^$~third-party");
        assert!(rule.is_check_third_party);
        assert!(!rule.is_third_party);
    }

    #[test]
    fn test_domain_option() {
        let rule = url("||example.com^$domain=a.com|~b.com");
        assert_eq!(rule.permitted_domains, vec!["a.com"]);
        assert_eq!(rule.restricted_domains, vec!["b.com"]);
    }

    #[test]
    fn test_badfilter() {
        let rule = url("||example.com^$badfilter");
        assert!(rule.is_bad_filter);
        assert_eq!(rule.bad_filter.as_deref(), Some("||example.com^"));

        let rule = url("||example.com^$image,badfilter,third-party");
        assert_eq!(
            rule.bad_filter.as_deref(),
            Some("||example.com^$image,third-party")
        );
    }

    #[test]
    fn test_unknown_option_is_error() {
        assert!(create_rule("||example.com^$nonsense").is_err());
    }

    #[test]
    fn test_whitelist_option_on_blocking_rule_is_error() {
        assert!(create_rule("||example.com^$elemhide").is_err());
        assert!(create_rule("@@||example.com^$elemhide").is_ok());
    }

    #[test]
    fn test_elemhide_rule() {
        let rule = css("example.com##.ad-banner");
        assert_eq!(rule.css_selector, ".ad-banner");
        assert_eq!(rule.permitted_domains, vec!["example.com"]);
        assert!(!rule.is_white_list);
        assert!(!rule.extended_css);
        assert!(!rule.is_inject_rule);
    }

    #[test]
    fn test_elemhide_exception_rule() {
        let rule = css("example.com#@#.ad-banner");
        assert!(rule.is_white_list);
    }

    #[test]
    fn test_extended_and_inject_marks() {
        assert!(css("example.com#?#.banner:-abp-has(a)").extended_css);
        assert!(css("example.com#$#.banner { display: none!important; }").is_inject_rule);
        let rule = css("example.com#@$?#.banner:-abp-has(a)");
        assert!(rule.is_white_list && rule.extended_css && rule.is_inject_rule);
    }

    #[test]
    fn test_css_domain_negation() {
        let rule = css("example.com,~sub.example.com##.ad");
        assert_eq!(rule.permitted_domains, vec!["example.com"]);
        assert_eq!(rule.restricted_domains, vec!["sub.example.com"]);
    }

    #[test]
    fn test_empty_selector_is_error() {
        assert!(create_rule("example.com##").is_err());
    }

    #[test]
    fn test_script_rule() {
        let rule = create_rule("example.com#%#window.adsDisabled = true;").unwrap().unwrap();
        assert!(matches!(rule, Rule::Script(_)));
    }

    #[test]
    fn test_scriptlet_rule() {
        let rule = create_rule("example.com#%#//scriptlet(\"abort-on-property-read\", \"ads\")")
            .unwrap()
            .unwrap();
        assert!(matches!(rule, Rule::Scriptlet(_)));
    }

    #[test]
    fn test_ubo_scriptlet_is_normalized() {
        let rule = create_rule("example.com##+js(aopr, ads)").unwrap().unwrap();
        let Rule::Scriptlet(rule) = rule else {
            panic!("expected scriptlet");
        };
        assert_eq!(
            rule.converted_rule_text,
            "example.com#%#//scriptlet(aopr, ads)"
        );
        assert_eq!(rule.rule_text, "example.com##+js(aopr, ads)");
    }

    #[test]
    fn test_popup_option() {
        let rule = url("||example.com^$popup");
        assert!(rule.is_block_popups);
        assert_eq!(rule.permitted_content_type, ContentType::SUBDOCUMENT);
    }

    #[test]
    fn test_trailing_dollar_is_pattern() {
        let rule = url("||example.com/page$");
        assert_eq!(rule.url_rule_text, "||example.com/page$");
        assert!(!rule.is_bad_filter);
    }
}
