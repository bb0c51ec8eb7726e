//! Rule sets evaluated by the classifier.
//!
//! Each rule set is an independent, stateless group of signatures sharing one
//! rejection code:
//! - Malicious patterns (path traversal, script injection, SQL/code injection)
//! - Size limit on the request target
//! - Sensitive-path probes (dotfiles, CMS admin paths, server-side scripts)
//! - Bot signatures matched against `user-agent` (off by default)

pub mod catalog;
pub mod pattern;
pub mod size_limit;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

pub use pattern::{MatchScope, PatternRuleSet};
pub use size_limit::SizeLimitRule;

use super::{RejectCode, RequestDescriptor};

/// Errors raised while compiling rule catalogs. Only ever surfaced at
/// configuration-load time.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("Invalid pattern '{pattern}' in rule set '{rule_set}': {source}")]
    InvalidPattern {
        rule_set: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid header name '{0}'")]
    InvalidHeaderName(String),
    #[error("Invalid value for header '{name}': '{value}'")]
    InvalidHeaderValue { name: String, value: String },
}

/// Threat level classification for rejected requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    /// Low severity threat
    Low,
    /// Medium severity threat
    Medium,
    /// High severity threat
    High,
}

impl ThreatLevel {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
        }
    }
}

/// The rule sets the classifier knows about, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSetKind {
    Malicious,
    SizeLimit,
    SensitivePath,
    BotSignature,
}

impl RuleSetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleSetKind::Malicious => "malicious",
            RuleSetKind::SizeLimit => "size_limit",
            RuleSetKind::SensitivePath => "sensitive_path",
            RuleSetKind::BotSignature => "bot_signature",
        }
    }

    pub fn reject_code(&self) -> RejectCode {
        match self {
            RuleSetKind::Malicious => RejectCode::BadRequest,
            RuleSetKind::SizeLimit => RejectCode::UriTooLong,
            RuleSetKind::SensitivePath => RejectCode::NotFound,
            RuleSetKind::BotSignature => RejectCode::Forbidden,
        }
    }

    pub fn threat_level(&self) -> ThreatLevel {
        match self {
            RuleSetKind::Malicious => ThreatLevel::High,
            RuleSetKind::SizeLimit | RuleSetKind::SensitivePath => ThreatLevel::Medium,
            RuleSetKind::BotSignature => ThreatLevel::Low,
        }
    }
}

/// A rule set match. Detail stays server-side; callers only see `code`.
#[derive(Debug, Clone)]
pub struct SecurityViolation {
    pub rule_set: RuleSetKind,
    /// Name of the signature (or limit) that matched
    pub signature: String,
    pub code: RejectCode,
    pub threat_level: ThreatLevel,
    pub description: String,
}

impl SecurityViolation {
    pub fn new(
        rule_set: RuleSetKind,
        signature: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            rule_set,
            signature: signature.into(),
            code: rule_set.reject_code(),
            threat_level: rule_set.threat_level(),
            description: description.into(),
        }
    }
}

/// One compiled, case-insensitive pattern.
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    regex: Regex,
}

impl Signature {
    /// Compile a regular expression signature.
    pub fn regex(
        rule_set: RuleSetKind,
        name: impl Into<String>,
        pattern: &str,
    ) -> Result<Self, CatalogError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| CatalogError::InvalidPattern {
                rule_set: rule_set.as_str(),
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            name: name.into(),
            regex,
        })
    }

    /// Compile a literal substring signature.
    pub fn literal(rule_set: RuleSetKind, needle: &str) -> Result<Self, CatalogError> {
        Self::regex(rule_set, needle, &regex::escape(needle))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

/// Security rule trait for classifying requests
pub trait SecurityRule: Send + Sync {
    /// Check a request descriptor
    ///
    /// # Returns
    /// * `Ok(())` if the rule set does not match
    /// * `Err(SecurityViolation)` on the first matching rule
    fn check(&self, request: &RequestDescriptor) -> Result<(), SecurityViolation>;

    /// Which rule set this is
    fn kind(&self) -> RuleSetKind;

    /// Check if the rule set is enabled
    fn is_enabled(&self) -> bool;
}
