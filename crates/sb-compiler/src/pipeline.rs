//! Conversion pipeline
//!
//! Owns the whole life of one `convert_array` call: building rules from
//! text, `$badfilter` suppression, translation, routing entries into
//! ordered category buckets and handing the result to the finalizer.
//! Errors never abort the pipeline; each one is recorded and the next
//! rule is processed.

use std::collections::HashSet;

use log::info;
use sb_core::entry::{ActionType, Entry};
use sb_core::pattern::RegexConfig;
use sb_core::rule::Rule;
use sb_core::types::RuleOption;

use crate::compactor::compact_css;
use crate::exceptions::apply_css_exceptions;
use crate::finalizer::finalize;
use crate::parser::create_rule;
use crate::translator::translate_rule;

/// One pipeline input: a raw filter list line, or a rule parsed
/// elsewhere.
#[derive(Debug, Clone)]
pub enum ConvertInput {
    Line(String),
    Rule(Rule),
}

impl From<&str> for ConvertInput {
    fn from(line: &str) -> Self {
        ConvertInput::Line(line.to_string())
    }
}

impl From<String> for ConvertInput {
    fn from(line: String) -> Self {
        ConvertInput::Line(line)
    }
}

impl From<Rule> for ConvertInput {
    fn from(rule: Rule) -> Self {
        ConvertInput::Rule(rule)
    }
}

/// Ordered category buckets. The finalizer emits them in declaration
/// order; Safari applies rules in order, so this order encodes
/// precedence.
#[derive(Debug, Default)]
pub struct ContentBlockerBuckets {
    pub css_blocking_wide: Vec<Entry>,
    pub css_blocking_generic_domain_sensitive: Vec<Entry>,
    pub css_blocking_generic_hide_exceptions: Vec<Entry>,
    pub css_blocking_domain_sensitive: Vec<Entry>,
    pub css_elemhide: Vec<Entry>,
    pub url_blocking: Vec<Entry>,
    pub other: Vec<Entry>,
    pub important: Vec<Entry>,
    pub important_exceptions: Vec<Entry>,
    pub document_exceptions: Vec<Entry>,
    pub errors: Vec<String>,
}

/// Result of one conversion call.
#[derive(Debug)]
pub struct ConversionResult {
    /// Entry count before the limit was applied.
    pub total_converted_count: usize,
    /// Entry count actually serialized.
    pub converted_count: usize,
    pub errors_count: usize,
    pub over_limit: bool,
    /// The serialized JSON array.
    pub converted: String,
    pub errors: Vec<String>,
}

/// Convert a batch of rules or raw lines into content blocker JSON.
///
/// `limit` caps the emitted entry count (`0` disables the cap).
/// `optimize` discards wide generic CSS rules, which are the slowest
/// entries to evaluate.
pub fn convert_array(input: Vec<ConvertInput>, limit: usize, optimize: bool) -> ConversionResult {
    let config = RegexConfig::content_blocker();
    let mut errors = Vec::new();

    let mut rules = Vec::new();
    for item in input {
        match item {
            ConvertInput::Rule(rule) => rules.push(rule),
            ConvertInput::Line(line) => match create_rule(&line) {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {}
                Err(err) => {
                    errors.push(format!(
                        "Unable to convert rule \"{}\": {}",
                        line.trim_end(),
                        err
                    ));
                }
            },
        }
    }

    // $badfilter rules are not translated; they cancel other rules by
    // text equality.
    let mut bad_filter_exceptions: HashSet<String> = HashSet::new();
    let mut ag_rules = Vec::new();
    for rule in rules {
        if rule.is_bad_filter() {
            if let Some(bad_filter) = rule.bad_filter() {
                bad_filter_exceptions.insert(bad_filter.to_string());
            }
        } else {
            ag_rules.push(rule);
        }
    }

    let mut buckets = ContentBlockerBuckets::default();
    let mut css_blocking = Vec::new();
    let mut css_exceptions = Vec::new();

    for rule in &ag_rules {
        if bad_filter_exceptions.contains(rule.rule_text()) {
            info!("Rule \"{}\" removed by a $badfilter rule", rule.rule_text());
            continue;
        }

        match translate_rule(rule, &config) {
            Ok(entry) => route_entry(
                rule,
                entry,
                &mut buckets,
                &mut css_blocking,
                &mut css_exceptions,
            ),
            Err(err) => {
                errors.push(format!(
                    "Unable to convert rule \"{}\": {}",
                    rule.rule_text(),
                    err
                ));
            }
        }
    }

    let css_blocking = apply_css_exceptions(css_blocking, &css_exceptions, &mut errors);
    let compacted = compact_css(css_blocking);
    if optimize {
        info!(
            "Optimization enabled: {} wide generic CSS rules discarded",
            compacted.wide.len()
        );
    } else {
        buckets.css_blocking_wide = compacted.wide;
    }
    buckets.css_blocking_generic_domain_sensitive = compacted.generic_domain_sensitive;
    buckets.css_blocking_domain_sensitive = compacted.domain_sensitive;
    buckets.errors = errors;

    finalize(buckets, limit)
}

/// Convert a single filter line. Errors are written to the supplied
/// sink.
pub fn convert_line(line: &str, errors: &mut Vec<String>) -> Option<Entry> {
    let config = RegexConfig::content_blocker();
    match create_rule(line) {
        Ok(Some(rule)) => match translate_rule(&rule, &config) {
            Ok(entry) => Some(entry),
            Err(err) => {
                errors.push(format!(
                    "Unable to convert rule \"{}\": {}",
                    rule.rule_text(),
                    err
                ));
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            errors.push(format!(
                "Unable to convert rule \"{}\": {}",
                line.trim_end(),
                err
            ));
            None
        }
    }
}

/// Route one translated entry into its category. First match wins.
fn route_entry(
    rule: &Rule,
    entry: Entry,
    buckets: &mut ContentBlockerBuckets,
    css_blocking: &mut Vec<Entry>,
    css_exceptions: &mut Vec<Entry>,
) {
    match entry.action.action_type {
        ActionType::Block => {
            if rule.is_important() {
                buckets.important.push(entry);
            } else {
                buckets.url_blocking.push(entry);
            }
        }
        ActionType::CssDisplayNone => css_blocking.push(entry),
        ActionType::IgnorePreviousRules => {
            let has_selector = entry
                .action
                .selector
                .as_ref()
                .is_some_and(|selector| !selector.is_empty());
            if has_selector {
                css_exceptions.push(entry);
            } else if is_single_option(rule, RuleOption::GENERICHIDE) {
                buckets.css_blocking_generic_hide_exceptions.push(entry);
            } else if is_single_option(rule, RuleOption::ELEMHIDE) {
                buckets.css_elemhide.push(entry);
            } else if rule.is_important() {
                buckets.important_exceptions.push(entry);
            } else if is_document_white_list(rule) {
                buckets.document_exceptions.push(entry);
            } else {
                buckets.other.push(entry);
            }
        }
    }
}

fn is_single_option(rule: &Rule, option: RuleOption) -> bool {
    match rule {
        Rule::Url(rule) => rule.is_single_option(option),
        _ => false,
    }
}

fn is_document_white_list(rule: &Rule) -> bool {
    match rule {
        Rule::Url(rule) => rule.is_document_white_list(),
        _ => false,
    }
}
