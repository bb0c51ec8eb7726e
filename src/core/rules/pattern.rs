//! Signature-catalog rule sets.

use std::borrow::Cow;

use super::{
    CatalogError, RequestDescriptor, RuleSetKind, SecurityRule, SecurityViolation, Signature,
};

/// Which part of the request a pattern rule set inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// Path and query joined
    Target,
    /// Path only
    Path,
    /// The `user-agent` header
    UserAgent,
}

/// An ordered list of signatures; the first match wins.
pub struct PatternRuleSet {
    kind: RuleSetKind,
    scope: MatchScope,
    signatures: Vec<Signature>,
    /// Also match the percent-decoded input
    decode_escapes: bool,
    enabled: bool,
}

impl PatternRuleSet {
    pub fn new(kind: RuleSetKind, scope: MatchScope, enabled: bool) -> Self {
        Self {
            kind,
            scope,
            signatures: Vec::new(),
            decode_escapes: false,
            enabled,
        }
    }

    /// Match the percent-decoded input in addition to the raw one.
    pub fn with_decoding(mut self, decode_escapes: bool) -> Self {
        self.decode_escapes = decode_escapes;
        self
    }

    /// Add a named regular expression signature
    pub fn add_pattern(&mut self, name: &str, pattern: &str) -> Result<(), CatalogError> {
        self.signatures
            .push(Signature::regex(self.kind, name, pattern)?);
        Ok(())
    }

    /// Add a literal substring signature
    pub fn add_literal(&mut self, needle: &str) -> Result<(), CatalogError> {
        self.signatures
            .push(Signature::literal(self.kind, needle)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    fn subject<'a>(&self, request: &'a RequestDescriptor) -> Cow<'a, str> {
        match self.scope {
            MatchScope::Target => Cow::Owned(request.target()),
            MatchScope::Path => Cow::Borrowed(request.path()),
            MatchScope::UserAgent => Cow::Borrowed(request.user_agent()),
        }
    }

    fn find_match(&self, input: &str) -> Option<&Signature> {
        let decoded = if self.decode_escapes {
            urlencoding::decode(input).ok()
        } else {
            None
        };

        self.signatures.iter().find(|signature| {
            signature.is_match(input)
                || decoded
                    .as_deref()
                    .is_some_and(|decoded| signature.is_match(decoded))
        })
    }
}

impl SecurityRule for PatternRuleSet {
    fn check(&self, request: &RequestDescriptor) -> Result<(), SecurityViolation> {
        if !self.enabled {
            return Ok(());
        }

        let subject = self.subject(request);
        if subject.is_empty() {
            return Ok(());
        }

        match self.find_match(&subject) {
            Some(signature) => Err(SecurityViolation::new(
                self.kind,
                signature.name(),
                format!("matched pattern {}", signature.pattern()),
            )),
            None => Ok(()),
        }
    }

    fn kind(&self) -> RuleSetKind {
        self.kind
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
