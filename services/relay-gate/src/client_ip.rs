// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client identifier extraction.
//!
//! The same precedence applies everywhere an identifier is derived (the
//! admission layer, health checks, file pulls):
//!
//! 1. the trusted forwarding header, if present and non-empty, verbatim;
//! 2. otherwise the connection's peer address without its port;
//! 3. otherwise [`UNKNOWN_CLIENT`].

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, Request};
use std::net::SocketAddr;

/// Identifier used when neither header nor peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derives client identifiers from requests.
#[derive(Debug, Clone)]
pub struct IdentifierSource {
    forwarded_header: HeaderName,
}

impl IdentifierSource {
    pub fn new(forwarded_header: HeaderName) -> Self {
        Self { forwarded_header }
    }

    pub fn forwarded_header(&self) -> &HeaderName {
        &self.forwarded_header
    }

    /// Identifier from request headers and an optional peer address.
    pub fn identify(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let forwarded = headers
            .get(&self.forwarded_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (forwarded, peer) {
            (Some(value), _) => value.to_string(),
            (None, Some(addr)) => addr.ip().to_string(),
            (None, None) => UNKNOWN_CLIENT.to_string(),
        }
    }

    /// Identifier for a request whose peer address, if any, was recorded by
    /// `into_make_service_with_connect_info`.
    pub fn identify_request<B>(&self, request: &Request<B>) -> String {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        self.identify(request.headers(), peer)
    }
}

impl Default for IdentifierSource {
    fn default() -> Self {
        Self::new(HeaderName::from_static("x-forwarded-for"))
    }
}
