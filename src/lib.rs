//! showroom-guard - inbound request filter for the dealership site.
//!
//! Every request is classified before any page rendering runs. The classifier is a
//! deterministic, rule-based pre-filter: it checks the request target against ordered
//! rule sets and either rejects with a fixed status code or lets the request through
//! with a fresh tracking id and a MIME-sniffing guard header.
//!
//! # Rule sets (first match wins)
//! 1. Malicious patterns on path + query (traversal, script injection, SQL/code injection) → `400`
//! 2. Request target longer than the size limit → `414`
//! 3. Sensitive-path probes on the path (dotfiles, CMS admin paths, script extensions) → `404`
//! 4. Bot signatures on `user-agent` (off by default) → `403`
//!
//! # Quick Example
//! ```no_run
//! use http::HeaderMap;
//! use showroom_guard::core::{RequestClassifier, RequestDescriptor};
//!
//! let classifier = RequestClassifier::default();
//! let verdict = classifier.classify(&RequestDescriptor::new("/.env", "", HeaderMap::new()));
//! assert_eq!(verdict.status().as_u16(), 404);
//! ```
//!
//! # Architecture
//! `core` holds the framework-independent classifier. `adapters` contains the axum
//! middleware that maps native requests onto a [`core::RequestDescriptor`] and honours
//! the [`core::Verdict`], plus a file-backed configuration provider used for hot reload.
//!
//! # Error Handling
//! Catalog and configuration problems surface as typed errors when the classifier is built.
//! Classification itself never fails.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{FileConfigProvider, GuardState, guard_middleware, with_guard},
    core::{RejectCode, RequestClassifier, RequestDescriptor, Verdict},
    utils::GracefulShutdown,
};
