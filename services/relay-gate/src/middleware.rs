// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tower layer that puts the admission controller in front of a service.
//!
//! Rejected requests get `429 Too Many Requests` with a `Retry-After` header
//! and never reach the inner service. Admitted requests are passed through
//! untouched.

use crate::client_ip::IdentifierSource;
use crate::limiter::{Admission, AdmissionController};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};

#[derive(Clone)]
pub struct AdmissionLayer {
    controller: Arc<AdmissionController>,
    identifiers: IdentifierSource,
}

impl AdmissionLayer {
    pub fn new(controller: Arc<AdmissionController>, identifiers: IdentifierSource) -> Self {
        Self {
            controller,
            identifiers,
        }
    }
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = AdmissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            controller: self.controller.clone(),
            identifiers: self.identifiers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AdmissionService<S> {
    inner: S,
    controller: Arc<AdmissionController>,
    identifiers: IdentifierSource,
}

impl<S> Service<Request<Body>> for AdmissionService<S>
where
    S: Service<Request<Body>, Response = Response> + Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let identifier = self.identifiers.identify_request(&request);

        // The decision is synchronous, so the inner service is only called
        // for admitted requests.
        match self.controller.check(&identifier) {
            Admission::Admitted => Box::pin(self.inner.call(request)),
            Admission::Rejected { retry_after } => {
                Box::pin(std::future::ready(Ok(too_many_requests(retry_after))))
            }
        }
    }
}

fn too_many_requests(retry_after: Duration) -> Response {
    // Retry-After is whole seconds; round up so clients never retry early.
    let secs = retry_after
        .as_secs()
        .saturating_add(u64::from(retry_after.subsec_nanos() > 0));
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, secs.to_string())],
        "Too Many Requests",
    )
        .into_response()
}
