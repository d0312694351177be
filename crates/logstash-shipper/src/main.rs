// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

mod config;

use std::process::ExitCode;

use tokio::io::{stdin, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{ShipperConfig, ShipperError, Transport};
use logstash_transport::{pipe_counted, HttpSink, PipeStats, Sink, TcpSink, UdpSink};

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = match ShipperConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("logstash-shipper: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.log_level);
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(false)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("logstash-shipper: failed to install log subscriber: {e}");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ShipperConfig) -> Result<(), ShipperError> {
    let authority = config.options.authority();
    let mut sink: Box<dyn Sink> = match config.transport {
        Transport::Http => Box::new(
            HttpSink::new(config.options).map_err(logstash_transport::SinkError::from)?,
        ),
        Transport::Tcp => Box::new(TcpSink::connect(config.options).await?),
        Transport::Udp => Box::new(UdpSink::connect(config.options).await?),
    };
    info!("Shipping records to {authority} over {:?}", config.transport);

    let reader = BufReader::new(stdin());
    let mut stats = PipeStats::default();
    let interrupted = tokio::select! {
        result = pipe_counted(reader, sink.as_mut(), &mut stats) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    sink.close().await?;
    let reason = if interrupted { "Interrupted" } else { "Input closed" };
    info!(
        "{reason}: {} records delivered, {} failed",
        stats.delivered, stats.failed
    );
    Ok(())
}
