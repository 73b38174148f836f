//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single backend HTTP call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// Debounce, cooldown and timeout windows, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Continuous dwell on a field before it is reported.
    #[serde(default = "default_focus_debounce")]
    pub focus_debounce_ms: u64,

    /// Same field (element or label) reported again within this window is dropped.
    #[serde(default = "default_focus_cooldown")]
    pub focus_cooldown_ms: u64,

    /// Non-field intents are dropped within this window after any intent.
    #[serde(default = "default_intent_cooldown")]
    pub intent_cooldown_ms: u64,

    /// Idle time without explicit intents before a context update may fire.
    #[serde(default = "default_context_idle")]
    pub context_idle_ms: u64,

    /// Delay after a URL change before the page is re-scanned.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Bound on the panel's page-content request.
    #[serde(default = "default_snippet_timeout")]
    pub snippet_timeout_ms: u64,

    #[serde(default = "default_auth_poll_interval")]
    pub auth_poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            focus_debounce_ms: default_focus_debounce(),
            focus_cooldown_ms: default_focus_cooldown(),
            intent_cooldown_ms: default_intent_cooldown(),
            context_idle_ms: default_context_idle(),
            settle_delay_ms: default_settle_delay(),
            snippet_timeout_ms: default_snippet_timeout(),
            auth_poll_interval_ms: default_auth_poll_interval(),
        }
    }
}

impl TimingConfig {
    pub fn focus_debounce(&self) -> Duration {
        Duration::from_millis(self.focus_debounce_ms)
    }

    pub fn focus_cooldown(&self) -> Duration {
        Duration::from_millis(self.focus_cooldown_ms)
    }

    pub fn intent_cooldown(&self) -> Duration {
        Duration::from_millis(self.intent_cooldown_ms)
    }

    pub fn context_idle(&self) -> Duration {
        Duration::from_millis(self.context_idle_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn snippet_timeout(&self) -> Duration {
        Duration::from_millis(self.snippet_timeout_ms)
    }

    pub fn auth_poll_interval(&self) -> Duration {
        Duration::from_millis(self.auth_poll_interval_ms)
    }
}

fn default_focus_debounce() -> u64 {
    800
}

fn default_focus_cooldown() -> u64 {
    1000
}

fn default_intent_cooldown() -> u64 {
    2000
}

fn default_context_idle() -> u64 {
    5000
}

fn default_settle_delay() -> u64 {
    1000
}

fn default_snippet_timeout() -> u64 {
    2000
}

fn default_auth_poll_interval() -> u64 {
    2000
}

/// Page observer vocabularies and bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Header selectors in priority order.
    #[serde(default = "default_title_selectors")]
    pub title_selectors: Vec<String>,

    /// Header texts that never count as a page header (case-insensitive).
    #[serde(default = "default_generic_titles")]
    pub generic_titles: Vec<String>,

    /// Known connector names, matched as case-insensitive substrings in order.
    #[serde(default = "default_connectors")]
    pub connectors: Vec<String>,

    /// Field labels containing any of these (case-insensitive) are ignored.
    #[serde(default = "default_excluded_labels")]
    pub excluded_labels: Vec<String>,

    /// URL fragments marking pages where a detected connector stays relevant.
    #[serde(default = "default_connector_context_markers")]
    pub connector_context_markers: Vec<String>,

    /// Main content region selectors in priority order.
    #[serde(default = "default_main_selectors")]
    pub main_selectors: Vec<String>,

    /// Floating layers (open dropdowns, dialogs) appended to snippets when visible.
    #[serde(default = "default_overlay_selectors")]
    pub overlay_selectors: Vec<String>,

    /// Button texts that mean "advance the wizard".
    #[serde(default = "default_step_actions")]
    pub step_actions: Vec<String>,

    /// Button texts that mean "start a new connection".
    #[serde(default = "default_start_actions")]
    pub start_actions: Vec<String>,

    #[serde(default = "default_ancestor_label_depth")]
    pub ancestor_label_depth: usize,

    #[serde(default = "default_max_label_len")]
    pub max_label_len: usize,

    #[serde(default = "default_max_value_len")]
    pub max_value_len: usize,

    #[serde(default = "default_click_scan_depth")]
    pub click_scan_depth: usize,

    #[serde(default = "default_snippet_max_chars")]
    pub snippet_max_chars: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            title_selectors: default_title_selectors(),
            generic_titles: default_generic_titles(),
            connectors: default_connectors(),
            excluded_labels: default_excluded_labels(),
            connector_context_markers: default_connector_context_markers(),
            main_selectors: default_main_selectors(),
            overlay_selectors: default_overlay_selectors(),
            step_actions: default_step_actions(),
            start_actions: default_start_actions(),
            ancestor_label_depth: default_ancestor_label_depth(),
            max_label_len: default_max_label_len(),
            max_value_len: default_max_value_len(),
            click_scan_depth: default_click_scan_depth(),
            snippet_max_chars: default_snippet_max_chars(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_title_selectors() -> Vec<String> {
    strings(&[
        ".ms-Panel-headerText",
        "[role=dialog] h2",
        "h1",
        "[role=heading][aria-level=1]",
        "h2",
    ])
}

fn default_generic_titles() -> Vec<String> {
    strings(&[
        "Home",
        "Settings",
        "Microsoft 365 admin center",
        "Admin center",
        "Microsoft 365",
    ])
}

fn default_connectors() -> Vec<String> {
    strings(&[
        "Azure DevOps",
        "ServiceNow",
        "Salesforce",
        "Confluence",
        "MediaWiki",
        "Jira",
        "Oracle",
    ])
}

fn default_excluded_labels() -> Vec<String> {
    strings(&["search"])
}

fn default_connector_context_markers() -> Vec<String> {
    strings(&["connector", "searchandintelligence", "datasources"])
}

fn default_main_selectors() -> Vec<String> {
    strings(&["main", "[role=main]", "#MainContent"])
}

fn default_overlay_selectors() -> Vec<String> {
    strings(&["[role=listbox]", "[role=menu]", ".ms-Callout", ".ms-Layer"])
}

fn default_step_actions() -> Vec<String> {
    strings(&["next", "save", "validate"])
}

fn default_start_actions() -> Vec<String> {
    strings(&["add", "setup", "set up"])
}

fn default_ancestor_label_depth() -> usize {
    3
}

fn default_max_label_len() -> usize {
    80
}

fn default_max_value_len() -> usize {
    200
}

fn default_click_scan_depth() -> usize {
    6
}

fn default_snippet_max_chars() -> usize {
    15000
}

/// Panel-side advice routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Fields whose options depend on runtime page state; never served from history.
    #[serde(default = "default_dynamic_fields")]
    pub dynamic_fields: Vec<DynamicFieldRule>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            dynamic_fields: default_dynamic_fields(),
        }
    }
}

/// A class of dynamic fields recognised by label keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFieldRule {
    /// Class name used by confirmations.
    pub class: String,

    /// Case-insensitive label keywords.
    pub keywords: Vec<String>,
}

fn default_dynamic_fields() -> Vec<DynamicFieldRule> {
    vec![DynamicFieldRule {
        class: "connector_agent".to_string(),
        keywords: strings(&["graph connector agent", "agent"]),
    }]
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory (default: ~/.shadowpilot/logs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "shadowpilot.log".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
