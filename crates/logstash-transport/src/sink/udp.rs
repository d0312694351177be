// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fire-and-forget datagrams, one envelope per datagram.
//!
//! Same envelope and framing as the TCP sink. A successful write only means
//! the datagram left the local socket.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{lookup_host, UdpSocket};
use tracing::debug;

use crate::call_site::{BacktraceResolver, CallSiteResolver};
use crate::config::TransportOptions;
use crate::errors::{DeliveryError, SinkError};
use crate::sink::{delivery_failed, encode, Sink};

#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
    peer: SocketAddr,
    options: Arc<TransportOptions>,
    resolver: Arc<dyn CallSiteResolver>,
}

impl UdpSink {
    /// Resolves the collector, binds an ephemeral local socket of the same
    /// address family and connects it.
    pub async fn connect(options: TransportOptions) -> Result<Self, SinkError> {
        options.validate()?;
        let peer = lookup_host((options.host_name(), options.port))
            .await?
            .next()
            .ok_or_else(|| DeliveryError::Unresolved(options.authority()))?;
        let local = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        debug!("LOGSTASH | UDP sink sending to {peer}");

        Ok(Self {
            socket,
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
}

#[async_trait]
impl Sink for UdpSink {
    async fn write(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        let mut payload = encode(chunk, &self.options, self.resolver.as_ref())?;
        self.options.framing.apply(&mut payload);
        match self.socket.send(&payload).await {
            Ok(_) => Ok(()),
            Err(err) => Err(delivery_failed(
                self.options.error_policy,
                DeliveryError::Io(err),
            )),
        }
    }
}
