// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One `POST /` per record.
//!
//! Requests carry `Content-Type: application/json; charset=utf-8`, the body's
//! byte length as `Content-Length` and, when both credentials are configured,
//! `Authorization: Basic ...`. A record is complete when the collector answers
//! with a 2xx status. There is no retry: a failed record is reported to its
//! writer and the next record is an independent request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use tracing::debug;

use crate::call_site::{BacktraceResolver, CallSiteResolver};
use crate::config::TransportOptions;
use crate::errors::{ConfigurationError, DeliveryError, SinkError};
use crate::http::{build_client, default_headers, request_url};
use crate::sink::{delivery_failed, encode, Sink};

#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
    options: Arc<TransportOptions>,
    resolver: Arc<dyn CallSiteResolver>,
}

impl HttpSink {
    pub fn new(options: TransportOptions) -> Result<Self, ConfigurationError> {
        options.validate()?;
        let client = build_client(&options)?;
        let headers = default_headers(&options)?;
        let url = request_url(&options);
        debug!("LOGSTASH | HTTP sink targeting {url}");

        Ok(Self {
            client,
            url,
            headers,
            options: Arc::new(options),
            resolver: Arc::new(BacktraceResolver),
        })
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn CallSiteResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    async fn send(&self, payload: Vec<u8>) -> Result<(), DeliveryError> {
        let resp = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .header(CONTENT_LENGTH, payload.len())
            .body(payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(status))
        }
    }
}

#[async_trait]
impl Sink for HttpSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        let payload = encode(chunk, &self.options, self.resolver.as_ref())?;
        self.send(payload)
            .await
            .map_err(|err| delivery_failed(self.options.error_policy, err))
    }
}
