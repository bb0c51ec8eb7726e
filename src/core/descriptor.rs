//! Per-request input to the classifier.

use std::borrow::Cow;

use http::{HeaderMap, Uri, header::USER_AGENT};

/// Immutable view of one inbound request, built by the host and dropped once
/// the verdict has been acted upon.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    path: String,
    query: String,
    headers: HeaderMap,
    total_length: usize,
}

impl RequestDescriptor {
    /// Build a descriptor from its parts. `query` must not carry the leading `?`.
    pub fn new(path: impl Into<String>, query: impl Into<String>, headers: HeaderMap) -> Self {
        let path = path.into();
        let query = query.into();
        let total_length = path.len() + query.len();
        Self {
            path,
            query,
            headers,
            total_length,
        }
    }

    /// Adapt a native request target and header map. The path is
    /// percent-decoded so rules see what a file server would resolve; the
    /// query stays raw and `total_length` counts the bytes on the wire.
    pub fn from_uri(uri: &Uri, headers: &HeaderMap) -> Self {
        let raw_path = uri.path();
        let query = uri.query().unwrap_or_default();
        let path = urlencoding::decode(raw_path).unwrap_or(Cow::Borrowed(raw_path));
        Self {
            path: path.into_owned(),
            query: query.to_string(),
            headers: headers.clone(),
            total_length: raw_path.len() + query.len(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Byte length of path and query combined.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Path and query joined the way they appear on the request line.
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// The `user-agent` header, or `""` when absent or not valid ASCII.
    pub fn user_agent(&self) -> &str {
        self.headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}
