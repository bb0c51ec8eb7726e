//! Request-target size limit.

use super::{RequestDescriptor, RuleSetKind, SecurityRule, SecurityViolation};

/// Default maximum combined path + query length in bytes.
pub const DEFAULT_MAX_LENGTH: usize = 2048;

pub struct SizeLimitRule {
    max_length: usize,
    enabled: bool,
}

impl SizeLimitRule {
    pub fn new(max_length: usize, enabled: bool) -> Self {
        Self {
            max_length,
            enabled,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for SizeLimitRule {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH, true)
    }
}

impl SecurityRule for SizeLimitRule {
    fn check(&self, request: &RequestDescriptor) -> Result<(), SecurityViolation> {
        if !self.enabled || request.total_length() <= self.max_length {
            return Ok(());
        }

        Err(SecurityViolation::new(
            RuleSetKind::SizeLimit,
            "max_length",
            format!(
                "request target is {} bytes, limit is {}",
                request.total_length(),
                self.max_length
            ),
        ))
    }

    fn kind(&self) -> RuleSetKind {
        RuleSetKind::SizeLimit
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
