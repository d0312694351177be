// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy shared by every sink.
//!
//! - [`ParseError`]: the incoming buffer is not one JSON object. Reported for the
//!   offending record only, nothing is sent.
//! - [`ConfigurationError`]: the sink cannot be built. Raised by constructors,
//!   never per record.
//! - [`DeliveryError`]: the transport failed or the collector refused the record.

use reqwest::StatusCode;

/// Errors raised while decoding a raw record buffer.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("record is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("record is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("record is not a JSON object")]
    NotAnObject,
}

/// Errors raised while constructing a sink.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("host is required")]
    MissingHost,

    #[error("port must be greater than 0")]
    InvalidPort,

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors raised while handing a serialized envelope to the transport.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("collector responded with {0}")]
    Rejected(StatusCode),

    #[error("no address found for {0}")]
    Unresolved(String),
}

/// Per-record outcome of a sink write.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to parse record: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid sink configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to deliver record: {0}")]
    Delivery(#[from] DeliveryError),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Delivery(DeliveryError::Io(err))
    }
}
