// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Canonical outbound event.
//!
//! [`build`] maps a [`RawRecord`] onto the collector's envelope shape:
//!
//! ```text
//! {
//!   "<timestamp_key>": "2023-11-14T22:13:20.000Z",
//!   "@version": 1,
//!   "level": "info",
//!   "message": ..., "hostname": ..., "logger": ..., "process": ...,
//!   "file": { "path", "function", "method", "line", "column" } | {},
//!   ...attributes
//! }
//! ```
//!
//! Attributes are merged last, in insertion order, and win over built-in
//! fields with the same key. Built-in fields whose source is missing are left
//! out instead of being sent as `null`.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::call_site::CallSite;
use crate::config::TransportOptions;
use crate::record::RawRecord;

pub const VERSION: u64 = 1;
pub const INVALID_DATE: &str = "Invalid Date";

// Largest magnitude, in milliseconds, of a representable instant.
const MAX_TIME_MS: f64 = 8.64e15;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }

    fn set(&mut self, key: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.0.insert(key.to_string(), value);
            }
            None => {
                self.0.remove(key);
            }
        }
    }
}

/// Builds the envelope for one record. Pure: call-site capture happens in the caller.
#[must_use]
pub fn build(raw: &RawRecord, options: &TransportOptions, call_site: Option<&CallSite>) -> Envelope {
    let mut envelope = Envelope::default();
    envelope.set(
        &options.timestamp_key,
        Some(Value::String(format_timestamp(raw.time()))),
    );
    envelope.set("@version", Some(Value::from(VERSION)));
    envelope.set(
        "level",
        raw.level()
            .and_then(|level| options.levels.label(level))
            .map(Value::from),
    );
    envelope.set("message", raw.msg().cloned());
    envelope.set("hostname", raw.hostname().cloned());
    envelope.set("logger", raw.name().cloned());
    envelope.set("process", raw.pid().cloned());
    envelope.set("file", Some(file_object(call_site)));

    for (key, value) in &options.attributes {
        envelope.set(key, Some(value.clone()));
    }
    envelope
}

fn file_object(call_site: Option<&CallSite>) -> Value {
    match call_site {
        Some(site) => json!({
            "path": site.path,
            "function": site.function,
            "method": site.method,
            "line": site.line.unwrap_or(0),
            "column": site.column.unwrap_or(0),
        }),
        None => Value::Object(Map::new()),
    }
}

/// Formats epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// Fractional milliseconds truncate toward zero. Years outside `0..=9999` use the
/// expanded `±YYYYYY` form. Missing, non-numeric and out-of-range inputs yield
/// [`INVALID_DATE`].
#[must_use]
pub fn format_timestamp(time: Option<&Value>) -> String {
    let Some(millis) = time.and_then(Value::as_f64) else {
        return INVALID_DATE.to_string();
    };
    if !millis.is_finite() || millis.abs() > MAX_TIME_MS {
        return INVALID_DATE.to_string();
    }
    #[allow(clippy::cast_possible_truncation)]
    let millis = millis.trunc() as i64;
    let Some(datetime) = DateTime::<Utc>::from_timestamp_millis(millis) else {
        return format_beyond_chrono(millis);
    };

    let year = datetime.year();
    if (0..=9999).contains(&year) {
        datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    } else {
        let sign = if year < 0 { '-' } else { '+' };
        format!(
            "{sign}{:06}{}",
            year.unsigned_abs(),
            datetime.format("-%m-%dT%H:%M:%S%.3fZ")
        )
    }
}

// chrono stops at year 262143; the remaining range up to ±8.64e15 ms is
// converted with the proleptic Gregorian days-to-civil algorithm.
fn format_beyond_chrono(millis: i64) -> String {
    let days = millis.div_euclid(MILLIS_PER_DAY);
    let in_day = millis.rem_euclid(MILLIS_PER_DAY);
    let (year, month, day) = civil_from_days(days);
    let sign = if year < 0 { '-' } else { '+' };
    format!(
        "{sign}{:06}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        year.unsigned_abs(),
        in_day / 3_600_000,
        in_day / 60_000 % 60,
        in_day / 1000 % 60,
        in_day % 1000,
    )
}

const MILLIS_PER_DAY: i64 = 86_400_000;

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
