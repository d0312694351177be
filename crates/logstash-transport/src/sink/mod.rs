// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sinks deliver one envelope per written record.
//!
//! Every sink runs the same per-record transaction:
//!
//! 1. parse the buffer as one JSON object (failure: [`SinkError::Parse`], nothing sent)
//! 2. resolve the call site and build the [`Envelope`](crate::envelope::Envelope)
//! 3. serialize it and hand it to the transport (exactly one send per record)
//!
//! `write` takes `&mut self`, so a sink never has more than one record in
//! flight and cannot be re-entered before the previous write completed.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, warn};

use crate::call_site::CallSiteResolver;
use crate::config::{DeliveryErrorPolicy, TransportOptions};
use crate::envelope;
use crate::errors::{DeliveryError, SinkError};
use crate::record::RawRecord;

pub mod http;
pub mod tcp;
pub mod udp;

#[async_trait]
pub trait Sink: Send {
    /// Delivers one record. `chunk` must hold exactly one JSON document.
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError>;

    async fn write_str(&mut self, chunk: &str) -> Result<(), SinkError> {
        self.write(chunk.as_bytes()).await
    }

    /// Releases the transport. Further writes are not supported.
    async fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Parses a record and serializes its envelope.
pub(crate) fn encode(
    chunk: &[u8],
    options: &TransportOptions,
    resolver: &dyn CallSiteResolver,
) -> Result<Vec<u8>, SinkError> {
    let raw = RawRecord::parse(chunk)?;
    let origin = resolver.origin();
    envelope::build(&raw, options, origin.as_ref())
        .to_vec()
        .map_err(SinkError::Serialize)
}

/// Applies the configured policy to a transport failure.
pub(crate) fn delivery_failed(policy: DeliveryErrorPolicy, err: DeliveryError) -> SinkError {
    match policy {
        DeliveryErrorPolicy::Report => {
            debug!("LOGSTASH | Failed to deliver record: {err}");
            SinkError::Delivery(err)
        }
        DeliveryErrorPolicy::Abort => {
            error!("LOGSTASH | Failed to deliver record, aborting: {err}");
            std::process::exit(1);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipeStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Feeds newline-delimited records from `reader` into `sink` until EOF.
///
/// Blank lines are skipped. A record that fails is logged and counted; it does
/// not stop the pipe. Only a read error on `reader` ends it early.
pub async fn pipe<R, S>(reader: R, sink: &mut S) -> std::io::Result<PipeStats>
where
    R: AsyncBufRead + Unpin,
    S: Sink + ?Sized,
{
    let mut stats = PipeStats::default();
    pipe_counted(reader, sink, &mut stats).await?;
    Ok(stats)
}

/// [`pipe`] with caller-owned counters, which stay accurate when the future is
/// dropped before EOF.
pub async fn pipe_counted<R, S>(
    mut reader: R,
    sink: &mut S,
    stats: &mut PipeStats,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Sink + ?Sized,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match sink.write(&line).await {
            Ok(()) => stats.delivered += 1,
            Err(e) => {
                stats.failed += 1;
                warn!("LOGSTASH | Dropping record: {e}");
            }
        }
    }
    debug!(
        "LOGSTASH | Input closed: {} delivered, {} failed",
        stats.delivered, stats.failed
    );
    Ok(())
}
