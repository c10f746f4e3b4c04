//! Parsed filter rule model
//!
//! Rules are a sum type selected over during translation. Only URL and
//! CSS rules can be expressed in Safari's content blocker format; script
//! and scriptlet rules exist so the translator can reject them with a
//! precise reason instead of the builder silently dropping them.

use crate::types::{ContentType, RuleOption};

/// A parsed filter rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// URL blocking or exception rule
    Url(UrlRule),
    /// Element hiding rule (##selector and friends)
    Css(CssRule),
    /// Javascript injection rule (#%#)
    Script(ScriptRule),
    /// Scriptlet rule (#%#//scriptlet(...))
    Scriptlet(ScriptletRule),
}

impl Rule {
    /// The original rule line.
    pub fn rule_text(&self) -> &str {
        match self {
            Rule::Url(r) => &r.rule_text,
            Rule::Css(r) => &r.rule_text,
            Rule::Script(r) => &r.rule_text,
            Rule::Scriptlet(r) => &r.rule_text,
        }
    }

    /// The rule line after dialect normalization. Equals `rule_text` when
    /// no rewrite applied.
    pub fn converted_rule_text(&self) -> &str {
        match self {
            Rule::Url(r) => &r.converted_rule_text,
            Rule::Css(r) => &r.converted_rule_text,
            Rule::Script(r) => &r.converted_rule_text,
            Rule::Scriptlet(r) => &r.converted_rule_text,
        }
    }

    pub fn is_white_list(&self) -> bool {
        match self {
            Rule::Url(r) => r.is_white_list,
            Rule::Css(r) => r.is_white_list,
            Rule::Script(r) => r.is_white_list,
            Rule::Scriptlet(r) => r.is_white_list,
        }
    }

    pub fn is_important(&self) -> bool {
        match self {
            Rule::Url(r) => r.is_important,
            _ => false,
        }
    }

    pub fn is_bad_filter(&self) -> bool {
        match self {
            Rule::Url(r) => r.is_bad_filter,
            _ => false,
        }
    }

    /// The filter text this rule cancels, for `$badfilter` rules.
    pub fn bad_filter(&self) -> Option<&str> {
        match self {
            Rule::Url(r) => r.bad_filter.as_deref(),
            _ => None,
        }
    }
}

/// A URL blocking or exception rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRule {
    pub rule_text: String,
    pub converted_rule_text: String,
    /// Pattern part without `@@` prefix and `$options` tail. May be
    /// empty, `*`, `|*` or `||*` for match-everything rules.
    pub url_rule_text: String,
    /// Regex body for `/.../` rules. Kept as source text: the converter
    /// never executes matches, and Safari accepts constructs (lookahead)
    /// that the host regex engine does not.
    pub regex_source: Option<String>,
    pub is_regex_rule: bool,
    pub is_white_list: bool,
    pub is_important: bool,
    pub is_bad_filter: bool,
    pub bad_filter: Option<String>,
    pub permitted_content_type: ContentType,
    pub restricted_content_type: ContentType,
    pub enabled_options: RuleOption,
    pub is_third_party: bool,
    pub is_check_third_party: bool,
    pub is_match_case: bool,
    pub is_block_popups: bool,
    pub is_csp: bool,
    pub replace: Option<String>,
    pub permitted_domains: Vec<String>,
    pub restricted_domains: Vec<String>,
}

impl UrlRule {
    /// A whitelist rule carrying the full `$document` option bundle.
    pub fn is_document_white_list(&self) -> bool {
        self.is_white_list && self.enabled_options.contains(RuleOption::DOCUMENT)
    }

    /// True iff `option` is the only enabled option. Exact equality, not
    /// bitmask intersection.
    pub fn is_single_option(&self, option: RuleOption) -> bool {
        self.enabled_options == option
    }
}

impl Default for UrlRule {
    fn default() -> Self {
        Self {
            rule_text: String::new(),
            converted_rule_text: String::new(),
            url_rule_text: String::new(),
            regex_source: None,
            is_regex_rule: false,
            is_white_list: false,
            is_important: false,
            is_bad_filter: false,
            bad_filter: None,
            permitted_content_type: ContentType::ALL,
            restricted_content_type: ContentType::empty(),
            enabled_options: RuleOption::empty(),
            is_third_party: false,
            is_check_third_party: false,
            is_match_case: false,
            is_block_popups: false,
            is_csp: false,
            replace: None,
            permitted_domains: Vec::new(),
            restricted_domains: Vec::new(),
        }
    }
}

/// An element hiding rule or exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub rule_text: String,
    pub converted_rule_text: String,
    pub css_selector: String,
    /// CSS injection rule (#$#). Not expressible in the target format.
    pub is_inject_rule: bool,
    /// Extended CSS rule (#?#). Not expressible in the target format.
    pub extended_css: bool,
    pub is_white_list: bool,
    pub permitted_domains: Vec<String>,
    pub restricted_domains: Vec<String>,
}

/// A javascript injection rule (#%#).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRule {
    pub rule_text: String,
    pub converted_rule_text: String,
    pub script: String,
    pub is_white_list: bool,
}

/// A scriptlet rule (#%#//scriptlet("name", args...)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptletRule {
    pub rule_text: String,
    pub converted_rule_text: String,
    pub payload: String,
    pub is_white_list: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_option_is_exact() {
        let rule = UrlRule {
            enabled_options: RuleOption::GENERICHIDE,
            is_white_list: true,
            ..UrlRule::default()
        };
        assert!(rule.is_single_option(RuleOption::GENERICHIDE));
        assert!(!rule.is_single_option(RuleOption::ELEMHIDE));

        let rule = UrlRule {
            enabled_options: RuleOption::GENERICHIDE | RuleOption::ELEMHIDE,
            ..UrlRule::default()
        };
        assert!(!rule.is_single_option(RuleOption::GENERICHIDE));
    }

    #[test]
    fn test_document_white_list() {
        let rule = UrlRule {
            is_white_list: true,
            enabled_options: RuleOption::DOCUMENT,
            ..UrlRule::default()
        };
        assert!(rule.is_document_white_list());

        // The bundle on a blocking rule is not a document whitelist
        let rule = UrlRule {
            is_white_list: false,
            enabled_options: RuleOption::DOCUMENT,
            ..UrlRule::default()
        };
        assert!(!rule.is_document_white_list());
    }
}
