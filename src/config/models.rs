//! Configuration data structures for the request guard.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files. Every section
//! carries defaults so an empty file yields the shipped behaviour.
use serde::{Deserialize, Serialize};

use crate::core::rules::size_limit::DEFAULT_MAX_LENGTH;

fn default_true() -> bool {
    true
}

/// A signature-catalog rule set.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RuleSetConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the shipped catalog when non-empty
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Appended after the catalog in use
    #[serde(default)]
    pub extra_patterns: Vec<String>,
    /// Also match the percent-decoded input
    #[serde(default)]
    pub decode_escapes: bool,
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
            extra_patterns: Vec::new(),
            decode_escapes: false,
        }
    }
}

/// Bot blocklist configuration. Off unless an operator turns it on.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BotBlocklistConfig {
    pub enabled: bool,
    /// Replaces the shipped identifiers when non-empty
    pub identifiers: Vec<String>,
    pub extra_identifiers: Vec<String>,
}

impl Default for BotBlocklistConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            identifiers: Vec::new(),
            extra_identifiers: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SizeLimitConfig {
    pub enabled: bool,
    /// Maximum path + query length in bytes
    pub max_length: usize,
}

impl Default for SizeLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

/// Headers injected into allowed requests and their responses
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HeadersConfig {
    /// Header carrying the per-request identifier
    pub tracking_header: String,
    /// Value of `x-content-type-options`
    pub content_type_options: String,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            tracking_header: "x-request-id".to_string(),
            content_type_options: "nosniff".to_string(),
        }
    }
}

/// Requests that bypass classification entirely
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Path prefixes, e.g. framework asset directories
    pub prefixes: Vec<String>,
    /// File extensions without the dot
    pub extensions: Vec<String>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
            ],
            extensions: ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GuardConfig {
    pub listen_addr: String,
    /// Directory served to allowed requests by the bundled server
    pub site_root: String,
    /// Global switch; when off every request is allowed
    pub enabled: bool,
    pub malicious: RuleSetConfig,
    pub size_limit: SizeLimitConfig,
    pub sensitive_paths: RuleSetConfig,
    pub bot_blocklist: BotBlocklistConfig,
    pub headers: HeadersConfig,
    pub exclusions: ExclusionConfig,
    /// Maximum characters of a rejected target written to the log
    pub log_truncate_chars: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            site_root: "./public".to_string(),
            enabled: true,
            malicious: RuleSetConfig::default(),
            size_limit: SizeLimitConfig::default(),
            sensitive_paths: RuleSetConfig::default(),
            bot_blocklist: BotBlocklistConfig::default(),
            headers: HeadersConfig::default(),
            exclusions: ExclusionConfig::default(),
            log_truncate_chars: 100,
        }
    }
}

impl GuardConfig {
    /// Create a new configuration builder
    pub fn builder() -> GuardConfigBuilder {
        GuardConfigBuilder::default()
    }
}

/// Builder for GuardConfig, mostly used by embedders and tests
#[derive(Default)]
pub struct GuardConfigBuilder {
    config: GuardConfig,
}

impl GuardConfigBuilder {
    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the directory served to allowed requests
    pub fn site_root(mut self, root: impl Into<String>) -> Self {
        self.config.site_root = root.into();
        self
    }

    /// Turn the bot blocklist on or off
    pub fn bot_blocklist(mut self, enabled: bool) -> Self {
        self.config.bot_blocklist.enabled = enabled;
        self
    }

    /// Add a crawler identifier on top of the shipped list
    pub fn extra_bot_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.config
            .bot_blocklist
            .extra_identifiers
            .push(identifier.into());
        self
    }

    /// Set the size limit in bytes
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.config.size_limit.max_length = max_length;
        self
    }

    /// Append a malicious-pattern signature
    pub fn extra_malicious_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config
            .malicious
            .extra_patterns
            .push(pattern.into());
        self
    }

    /// Append a sensitive-path signature
    pub fn extra_sensitive_path(mut self, pattern: impl Into<String>) -> Self {
        self.config
            .sensitive_paths
            .extra_patterns
            .push(pattern.into());
        self
    }

    /// Set the tracking header name
    pub fn tracking_header(mut self, name: impl Into<String>) -> Self {
        self.config.headers.tracking_header = name.into();
        self
    }

    /// Enable or disable the whole guard
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn build(self) -> GuardConfig {
        self.config
    }
}
