use std::net::SocketAddr;

use http::{HeaderName, HeaderValue};
use regex::RegexBuilder;

use crate::config::models::{GuardConfig, RuleSetConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid pattern '{pattern}' in '{field}': {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Guard configuration validator
pub struct GuardConfigValidator;

impl GuardConfigValidator {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(config: &GuardConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if config.size_limit.max_length == 0 {
            errors.push(ValidationError::InvalidField {
                field: "size_limit.max_length".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }

        if config.log_truncate_chars == 0 {
            errors.push(ValidationError::InvalidField {
                field: "log_truncate_chars".to_string(),
                message: "Must be greater than zero".to_string(),
            });
        }

        errors.extend(Self::validate_rule_set("malicious", &config.malicious));
        errors.extend(Self::validate_rule_set(
            "sensitive_paths",
            &config.sensitive_paths,
        ));

        let blocklist = &config.bot_blocklist;
        for identifier in blocklist
            .identifiers
            .iter()
            .chain(&blocklist.extra_identifiers)
        {
            if identifier.trim().is_empty() {
                errors.push(ValidationError::InvalidField {
                    field: "bot_blocklist.identifiers".to_string(),
                    message: "Identifiers must not be empty".to_string(),
                });
            }
        }

        if HeaderName::try_from(config.headers.tracking_header.as_str()).is_err() {
            errors.push(ValidationError::InvalidField {
                field: "headers.tracking_header".to_string(),
                message: format!(
                    "'{}' is not a valid header name",
                    config.headers.tracking_header
                ),
            });
        }

        if HeaderValue::from_str(&config.headers.content_type_options).is_err() {
            errors.push(ValidationError::InvalidField {
                field: "headers.content_type_options".to_string(),
                message: "Not a valid header value".to_string(),
            });
        }

        for prefix in &config.exclusions.prefixes {
            if !prefix.starts_with('/') {
                errors.push(ValidationError::InvalidField {
                    field: format!("exclusions.prefixes: {prefix}"),
                    message: "Prefixes must start with '/'".to_string(),
                });
            }
        }

        for ext in &config.exclusions.extensions {
            let ext = ext.trim_start_matches('.');
            if ext.is_empty() || ext.contains('/') {
                errors.push(ValidationError::InvalidField {
                    field: format!("exclusions.extensions: {ext}"),
                    message: "Extensions must be a bare file suffix such as 'png'".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_rule_set(name: &str, config: &RuleSetConfig) -> Vec<ValidationError> {
        config
            .patterns
            .iter()
            .chain(&config.extra_patterns)
            .filter_map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .err()
                    .map(|e| ValidationError::InvalidPattern {
                        field: name.to_string(),
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect()
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        let mut message = format!("Found {} configuration error(s):", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("\n  {}. {}", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GuardConfigValidator::validate(&GuardConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_listen_address() {
        let config = GuardConfig::builder().listen_addr("localhost").build();
        let err = GuardConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("localhost"));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = GuardConfig::builder()
            .extra_sensitive_path("(wp-")
            .build();
        let err = GuardConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("sensitive_paths"));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GuardConfig::builder()
            .max_length(0)
            .tracking_header("not valid")
            .build();
        config.exclusions.prefixes.push("_next".to_string());
        config.bot_blocklist.extra_identifiers.push("  ".to_string());

        let err = GuardConfigValidator::validate(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Found 4 configuration error(s)"));
        assert!(message.contains("size_limit.max_length"));
        assert!(message.contains("headers.tracking_header"));
        assert!(message.contains("_next"));
        assert!(message.contains("bot_blocklist"));
    }
}
