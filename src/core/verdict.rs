//! Classifier output.

use http::{HeaderMap, StatusCode};

/// Status codes a rule set may reject with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectCode {
    /// Malicious signature in path or query
    BadRequest,
    /// Blocked crawler
    Forbidden,
    /// Sensitive-path probe, indistinguishable from a missing page
    NotFound,
    /// Request target over the size limit
    UriTooLong,
}

impl RejectCode {
    pub fn status(&self) -> StatusCode {
        match self {
            RejectCode::BadRequest => StatusCode::BAD_REQUEST,
            RejectCode::Forbidden => StatusCode::FORBIDDEN,
            RejectCode::NotFound => StatusCode::NOT_FOUND,
            RejectCode::UriTooLong => StatusCode::URI_TOO_LONG,
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.status().as_u16()
    }

    /// Generic body text; never carries rule or pattern detail.
    pub fn reason(&self) -> &'static str {
        self.status().canonical_reason().unwrap_or("Error")
    }
}

/// Decision for a single request.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// Forward the request, attaching `headers` on the way through.
    Allow { headers: HeaderMap },
    /// Terminate immediately with the given code.
    Reject(RejectCode),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }

    pub fn reject_code(&self) -> Option<RejectCode> {
        match self {
            Verdict::Reject(code) => Some(*code),
            Verdict::Allow { .. } => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Verdict::Allow { .. } => StatusCode::OK,
            Verdict::Reject(code) => code.status(),
        }
    }
}
