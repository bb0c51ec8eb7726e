//! Axum adapter for the request classifier.
//!
//! The host builds a [`RequestDescriptor`] from the native request, consults the
//! current classifier snapshot and honours the verdict: rejects terminate the
//! request without reaching the router, allows continue with the tracking
//! headers attached to both the forwarded request and the response.
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    Router,
    extract::{Request, State},
    http::header::CONTENT_TYPE,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use crate::{
    config::GuardConfig,
    core::{CatalogError, ExclusionList, RejectCode, RequestClassifier, RequestDescriptor, Verdict},
    tracing_setup::create_request_span,
};

/// Shared, swappable classifier state. Each request loads one immutable
/// snapshot; reloads replace the snapshot atomically.
#[derive(Clone)]
pub struct GuardState {
    classifier: Arc<ArcSwap<RequestClassifier>>,
    exclusions: Arc<ArcSwap<ExclusionList>>,
}

impl GuardState {
    pub fn new(classifier: RequestClassifier, exclusions: ExclusionList) -> Self {
        Self {
            classifier: Arc::new(ArcSwap::from_pointee(classifier)),
            exclusions: Arc::new(ArcSwap::from_pointee(exclusions)),
        }
    }

    pub fn from_config(config: &GuardConfig) -> Result<Self, CatalogError> {
        Ok(Self::new(
            RequestClassifier::from_config(config)?,
            ExclusionList::from_config(&config.exclusions),
        ))
    }

    /// Rebuild from `config`. On error the current snapshot stays in place.
    pub fn reload(&self, config: &GuardConfig) -> Result<(), CatalogError> {
        let classifier = RequestClassifier::from_config(config)?;
        self.classifier.store(Arc::new(classifier));
        self.exclusions
            .store(Arc::new(ExclusionList::from_config(&config.exclusions)));
        Ok(())
    }

    pub fn classifier(&self) -> Arc<RequestClassifier> {
        self.classifier.load_full()
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclusions.load().is_excluded(path)
    }
}

/// Minimal response for a rejected request: status and reason phrase only.
pub fn reject_response(code: RejectCode) -> Response {
    (
        code.status(),
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        code.reason(),
    )
        .into_response()
}

/// Classify every request before it reaches the router.
pub async fn guard_middleware(
    State(state): State<GuardState>,
    mut req: Request,
    next: Next,
) -> Response {
    if state.is_excluded(req.uri().path()) {
        return next.run(req).await;
    }

    let classifier = state.classifier();
    let descriptor = RequestDescriptor::from_uri(req.uri(), req.headers());

    let headers = match classifier.classify(&descriptor) {
        Verdict::Reject(code) => return reject_response(code),
        Verdict::Allow { headers } => headers,
    };

    let request_id = headers
        .get(classifier.tracking_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let span = create_request_span(req.method().as_str(), descriptor.path(), request_id);

    for (name, value) in &headers {
        req.headers_mut().insert(name.clone(), value.clone());
    }

    let mut response = next.run(req).instrument(span).await;
    for (name, value) in &headers {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}

/// Put the guard in front of every route of `router`.
pub fn with_guard<S>(router: Router<S>, state: GuardState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(state, guard_middleware))
}
