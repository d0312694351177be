// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction for the HTTP sink.
//!
//! The client is TLS-capable (rustls by default, `native-tls` feature
//! otherwise); whether TLS is actually used depends on the request URL, which
//! the sink always builds with the `http` scheme.

use base64::Engine;
use core::time::Duration;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::config::TransportOptions;
use crate::errors::ConfigurationError;

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Builds the client used for every request of one sink.
pub fn build_client(options: &TransportOptions) -> Result<reqwest::Client, ConfigurationError> {
    let mut builder = reqwest::Client::builder()
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if let Some(timeout) = options.timeout() {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(ConfigurationError::Client)
}

/// Headers sent with every request: the JSON content type and, when both
/// credentials are configured, Basic-Auth.
pub fn default_headers(options: &TransportOptions) -> Result<HeaderMap, ConfigurationError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));

    if let Some((username, password)) = options.basic_auth() {
        let mut value = HeaderValue::from_str(&basic_auth_value(username, password))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

#[must_use]
pub fn basic_auth_value(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// Request URL for a collector: always `http://host:port/`.
#[must_use]
pub fn request_url(options: &TransportOptions) -> String {
    format!("http://{}/", options.authority())
}
