// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use logstash_transport::{DeliveryErrorPolicy, Framing, LevelTable, TransportOptions};
use serde_json::{Map, Value};
use std::env;

/// Errors raised while reading the shipper configuration
#[derive(Debug, thiserror::Error)]
pub enum ShipperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start sink: {0}")]
    SinkStart(#[from] logstash_transport::SinkError),

    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Tcp,
    Udp,
}

/// Process-level configuration, read from `LOGSTASH_*` environment variables
#[derive(Debug, Clone)]
pub struct ShipperConfig {
    pub transport: Transport,
    pub options: TransportOptions,
    /// Log level for the shipper's own diagnostics (trace, debug, info, warn, error)
    pub log_level: String,
}

impl ShipperConfig {
    pub fn from_env() -> Result<Self, ShipperError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ShipperError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = match lookup("LOGSTASH_TRANSPORT")
            .map(|val| val.to_lowercase())
            .as_deref()
        {
            None | Some("http") => Transport::Http,
            Some("tcp") => Transport::Tcp,
            Some("udp") => Transport::Udp,
            Some(other) => {
                return Err(ShipperError::InvalidConfig(format!(
                    "Invalid transport '{other}'. Must be one of: http, tcp, udp"
                )))
            }
        };

        let host = lookup("LOGSTASH_HOST").unwrap_or_default();
        let port = match lookup("LOGSTASH_PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|_| {
                ShipperError::InvalidConfig(format!("LOGSTASH_PORT is not a valid port: '{port}'"))
            })?,
            None => 0,
        };

        let mut options = TransportOptions::new(host, port);
        if let Some(key) = lookup("LOGSTASH_TIMESTAMP_KEY") {
            options = options.with_timestamp_key(key);
        }
        if let Some(attributes) = lookup("LOGSTASH_ATTRIBUTES") {
            options = options.with_attributes(parse_attributes(&attributes)?);
        }
        options.username = lookup("LOGSTASH_USERNAME");
        options.password = lookup("LOGSTASH_PASSWORD");
        options.framing = match lookup("LOGSTASH_FRAMING")
            .map(|val| val.to_lowercase())
            .as_deref()
        {
            None | Some("raw") => Framing::Raw,
            Some("lines") => Framing::NewlineDelimited,
            Some(other) => {
                return Err(ShipperError::InvalidConfig(format!(
                    "Invalid framing '{other}'. Must be one of: raw, lines"
                )))
            }
        };
        if let Some(levels) = lookup("LOGSTASH_LEVELS") {
            options = options.with_levels(parse_levels(&levels)?);
        }
        options.error_policy = match lookup("LOGSTASH_ERROR_POLICY")
            .map(|val| val.to_lowercase())
            .as_deref()
        {
            None | Some("report") => DeliveryErrorPolicy::Report,
            Some("abort") => DeliveryErrorPolicy::Abort,
            Some(other) => {
                return Err(ShipperError::InvalidConfig(format!(
                    "Invalid error policy '{other}'. Must be one of: report, abort"
                )))
            }
        };
        if let Some(timeout) = lookup("LOGSTASH_TIMEOUT_MS") {
            options.timeout_ms = Some(timeout.trim().parse::<u64>().map_err(|_| {
                ShipperError::InvalidConfig(format!("LOGSTASH_TIMEOUT_MS is not a number: '{timeout}'"))
            })?);
        }

        let log_level = lookup("LOGSTASH_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        let config = Self {
            transport,
            options,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ShipperError> {
        self.options
            .validate()
            .map_err(|e| ShipperError::InvalidConfig(e.to_string()))?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ShipperError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }
        Ok(())
    }
}

fn parse_attributes(raw: &str) -> Result<Map<String, Value>, ShipperError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(attributes)) => Ok(attributes),
        Ok(_) => Err(ShipperError::InvalidConfig(
            "LOGSTASH_ATTRIBUTES must be a JSON object".to_string(),
        )),
        Err(e) => Err(ShipperError::InvalidConfig(format!(
            "LOGSTASH_ATTRIBUTES is not valid JSON: {e}"
        ))),
    }
}

/// Parses a `{"10": "trace", ...}` map of numeric levels to labels.
fn parse_levels(raw: &str) -> Result<LevelTable, ShipperError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(levels @ Value::Object(_)) => serde_json::from_value(levels).map_err(|e| {
            ShipperError::InvalidConfig(format!(
                "LOGSTASH_LEVELS must map numeric levels to labels: {e}"
            ))
        }),
        Ok(_) => Err(ShipperError::InvalidConfig(
            "LOGSTASH_LEVELS must be a JSON object".to_string(),
        )),
        Err(e) => Err(ShipperError::InvalidConfig(format!(
            "LOGSTASH_LEVELS is not valid JSON: {e}"
        ))),
    }
}
