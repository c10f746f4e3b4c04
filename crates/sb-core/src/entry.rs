//! Safari content blocker entry model
//!
//! These types map directly to the JSON consumed by the content blocker
//! engine: `{ "trigger": {...}, "action": {...} }` with kebab-case keys
//! and optional keys omitted entirely.

use serde::{Deserialize, Serialize};

/// A single content blocker rule: trigger condition plus action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub trigger: Trigger,
    pub action: Action,
}

/// Conditions restricting when the action fires.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Trigger {
    /// Regex matched against the full request URL. Always present.
    #[serde(rename = "url-filter")]
    pub url_filter: String,
    #[serde(
        rename = "url-filter-is-case-sensitive",
        skip_serializing_if = "Option::is_none"
    )]
    pub url_filter_is_case_sensitive: Option<bool>,
    #[serde(rename = "resource-type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<Vec<ResourceType>>,
    #[serde(rename = "load-type", skip_serializing_if = "Option::is_none")]
    pub load_type: Option<Vec<LoadType>>,
    #[serde(rename = "if-domain", skip_serializing_if = "Option::is_none")]
    pub if_domain: Option<Vec<String>>,
    #[serde(rename = "unless-domain", skip_serializing_if = "Option::is_none")]
    pub unless_domain: Option<Vec<String>>,
}

impl Trigger {
    /// True when both domain scopes carry values, which Safari rejects.
    pub fn has_conflicting_domains(&self) -> bool {
        let filled = |d: &Option<Vec<String>>| d.as_ref().is_some_and(|v| !v.is_empty());
        filled(&self.if_domain) && filled(&self.unless_domain)
    }
}

/// What happens when the trigger matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl Action {
    pub fn block() -> Self {
        Self {
            action_type: ActionType::Block,
            selector: None,
        }
    }

    pub fn css_display_none(selector: String) -> Self {
        Self {
            action_type: ActionType::CssDisplayNone,
            selector: Some(selector),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    Block,
    CssDisplayNone,
    IgnorePreviousRules,
}

/// Resource classes recognized by the target engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Image,
    StyleSheet,
    Script,
    Media,
    Raw,
    Font,
    Document,
    Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadType {
    FirstParty,
    ThirdParty,
}
