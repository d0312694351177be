// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log-shipping transports for Logstash-compatible collectors.
//!
//! A [`Sink`] accepts newline-delimited JSON records from a logging pipeline,
//! turns each one into a canonical [`Envelope`] enriched with call-site
//! provenance, and delivers it over HTTP ([`HttpSink`]), a persistent TCP
//! stream ([`TcpSink`]) or UDP datagrams ([`UdpSink`]).
//!
//! ```rust,ignore
//! use logstash_transport::{HttpSink, Sink, TransportOptions};
//!
//! let options = TransportOptions::new("logstash.internal", 8080)
//!     .with_attribute("service", "billing");
//! let mut sink = HttpSink::new(options)?;
//! sink.write(br#"{"time":1700000000000,"level":30,"msg":"hello"}"#).await?;
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod call_site;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod http;
pub mod levels;
pub mod record;
pub mod sink;

pub use call_site::{BacktraceResolver, CallSite, CallSiteResolver, FixedResolver, NoopResolver};
pub use config::{DeliveryErrorPolicy, Framing, TransportOptions};
pub use envelope::Envelope;
pub use errors::{ConfigurationError, DeliveryError, ParseError, SinkError};
pub use levels::LevelTable;
pub use record::RawRecord;
pub use sink::{
    http::HttpSink, pipe, pipe_counted, tcp::TcpSink, udp::UdpSink, PipeStats, Sink,
};
