// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Persistent stream connection, one envelope per write.
//!
//! The connection is opened once by [`TcpSink::connect`] and owned by the sink
//! until [`Sink::close`] or drop. There is no reconnect: once the peer goes
//! away every following write reports a delivery error. Envelopes reach the
//! peer in write order.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::call_site::{BacktraceResolver, CallSiteResolver};
use crate::config::TransportOptions;
use crate::errors::{DeliveryError, SinkError};
use crate::sink::{delivery_failed, encode, Sink};

#[derive(Debug)]
pub struct TcpSink {
    stream: TcpStream,
    peer: SocketAddr,
    options: Arc<TransportOptions>,
    resolver: Arc<dyn CallSiteResolver>,
}

impl TcpSink {
    /// Validates `options` and connects to the collector.
    pub async fn connect(options: TransportOptions) -> Result<Self, SinkError> {
        options.validate()?;
        let stream = TcpStream::connect((options.host_name(), options.port))
            .await
            .map_err(DeliveryError::Io)?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        debug!("LOGSTASH | TCP sink connected to {peer}");

        Ok(Self {
            stream,
            peer,
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
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn send(&mut self, payload: &[u8]) -> Result<(), DeliveryError> {
        self.stream.write_all(payload).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Sink for TcpSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        let mut payload = encode(chunk, &self.options, self.resolver.as_ref())?;
        self.options.framing.apply(&mut payload);
        let policy = self.options.error_policy;
        self.send(&payload)
            .await
            .map_err(|err| delivery_failed(policy, err))
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.stream.shutdown().await?;
        debug!("LOGSTASH | TCP sink to {} closed", self.peer);
        Ok(())
    }
}
