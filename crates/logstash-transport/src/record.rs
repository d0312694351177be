// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Raw records as emitted by the upstream logging pipeline.
//!
//! Each write carries exactly one JSON object. Field names follow the producer's
//! conventions (`time`, `level`, `msg`, `hostname`, `name`, `pid`) but nothing
//! is enforced: accessors hand back whatever JSON value is present.

use serde_json::{Map, Value};

use crate::errors::ParseError;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Decodes `buf` as UTF-8 and parses it as a single JSON object.
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(buf)?;
        Self::parse_str(text)
    }

    pub fn parse_str(text: &str) -> Result<Self, ParseError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ParseError::NotAnObject),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Epoch milliseconds.
    #[must_use]
    pub fn time(&self) -> Option<&Value> {
        self.get("time")
    }

    #[must_use]
    pub fn level(&self) -> Option<&Value> {
        self.get("level")
    }

    #[must_use]
    pub fn msg(&self) -> Option<&Value> {
        self.get("msg")
    }

    #[must_use]
    pub fn hostname(&self) -> Option<&Value> {
        self.get("hostname")
    }

    /// Logger name.
    #[must_use]
    pub fn name(&self) -> Option<&Value> {
        self.get("name")
    }

    #[must_use]
    pub fn pid(&self) -> Option<&Value> {
        self.get("pid")
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
