// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Numeric severity to label mapping.
//!
//! A table is resolved once per sink (see [`crate::config::TransportOptions::levels`])
//! instead of living in process-wide state, so two sinks can ship records from
//! producers with different custom levels.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Levels used by the producer when it does not register custom ones.
pub const DEFAULT_LEVELS: [(u64, &str); 6] = [
    (10, "trace"),
    (20, "debug"),
    (30, "info"),
    (40, "warn"),
    (50, "error"),
    (60, "fatal"),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<u64, String>")]
pub struct LevelTable {
    labels: BTreeMap<u64, String>,
    values: BTreeMap<String, u64>,
}

impl LevelTable {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        let labels: BTreeMap<u64, String> = labels
            .into_iter()
            .map(|(value, label)| (value, label.into()))
            .collect();
        let values = labels
            .iter()
            .map(|(value, label)| (label.clone(), *value))
            .collect();
        Self { labels, values }
    }

    /// Resolves the label for a record's `level` field.
    ///
    /// Accepts integral JSON numbers and strings holding a canonical decimal
    /// integer. Anything else resolves to `None`.
    #[must_use]
    pub fn label(&self, level: &Value) -> Option<&str> {
        let key = match level {
            Value::Number(number) => number.as_u64().or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            Value::String(text) => text
                .parse::<u64>()
                .ok()
                .filter(|parsed| parsed.to_string() == *text),
            _ => None,
        }?;
        self.labels.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn value(&self, label: &str) -> Option<u64> {
        self.values.get(label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = (u64, &str)> {
        self.labels
            .iter()
            .map(|(value, label)| (*value, label.as_str()))
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::from_labels(DEFAULT_LEVELS)
    }
}

impl From<BTreeMap<u64, String>> for LevelTable {
    fn from(labels: BTreeMap<u64, String>) -> Self {
        Self::from_labels(labels)
    }
}
