// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::ConfigurationError;
use crate::levels::LevelTable;

pub const DEFAULT_TIMESTAMP_KEY: &str = "@timestamp";

/// How a serialized envelope is framed on stream and datagram transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// The JSON document alone, no delimiter.
    #[default]
    Raw,
    /// The JSON document followed by `\n`, for `json_lines` codecs.
    NewlineDelimited,
}

impl Framing {
    pub(crate) fn apply(self, payload: &mut Vec<u8>) {
        if self == Framing::NewlineDelimited {
            payload.push(b'\n');
        }
    }
}

/// What a sink does when the transport fails for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorPolicy {
    /// Return the failure to the writer of that record.
    #[default]
    Report,
    /// Log the failure and terminate the process.
    Abort,
}

/// Per-sink configuration. Immutable once a sink has been built from it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportOptions {
    /// Collector host name or address.
    pub host: String,
    /// Collector port.
    pub port: u16,
    /// Key under which the ISO-8601 timestamp is emitted.
    #[serde(default = "default_timestamp_key")]
    pub timestamp_key: String,
    /// Extra fields merged into every envelope after the built-in ones.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Severity labels; defaults to the producer's standard levels.
    #[serde(default)]
    pub levels: LevelTable,
    #[serde(default)]
    pub framing: Framing,
    #[serde(default)]
    pub error_policy: DeliveryErrorPolicy,
    /// HTTP request timeout in milliseconds. Unset leaves the client default.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_timestamp_key() -> String {
    DEFAULT_TIMESTAMP_KEY.to_string()
}

impl TransportOptions {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timestamp_key: default_timestamp_key(),
            attributes: Map::new(),
            username: None,
            password: None,
            levels: LevelTable::default(),
            framing: Framing::default(),
            error_policy: DeliveryErrorPolicy::default(),
            timeout_ms: None,
        }
    }

    #[must_use]
    pub fn with_timestamp_key(mut self, key: impl Into<String>) -> Self {
        self.timestamp_key = key.into();
        self
    }

    /// Adds one attribute. Re-adding a key keeps its original position.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self
    }

    #[must_use]
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: DeliveryErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Fails when the collector address is incomplete.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.host_name().is_empty() {
            return Err(ConfigurationError::MissingHost);
        }
        if self.port == 0 {
            return Err(ConfigurationError::InvalidPort);
        }
        Ok(())
    }

    /// Credentials for Basic-Auth, only when both halves are configured.
    #[must_use]
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The host as given to the resolver: trimmed, IPv6 brackets removed.
    #[must_use]
    pub fn host_name(&self) -> &str {
        let host = self.host.trim();
        host.strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .unwrap_or(host)
            .trim()
    }

    /// `host:port`, bracketing IPv6 hosts.
    #[must_use]
    pub fn authority(&self) -> String {
        let host = self.host_name();
        if host.contains(':') {
            format!("[{host}]:{}", self.port)
        } else {
            format!("{host}:{}", self.port)
        }
    }
}
