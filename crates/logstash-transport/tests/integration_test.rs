// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use logstash_transport::{
    envelope, pipe, DeliveryError, Framing, HttpSink, NoopResolver, PipeStats, RawRecord, Sink,
    SinkError, TcpSink, TransportOptions, UdpSink,
};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

const RECORD: &str =
    r#"{"time":1700000000000,"level":30,"msg":"hello","hostname":"h1","name":"svc","pid":42}"#;

fn collector_address(server: &Server) -> (String, u16) {
    let host_with_port = server.host_with_port();
    let (host, port) = host_with_port
        .rsplit_once(':')
        .expect("mock server address has a port");
    (host.to_string(), port.parse().expect("numeric port"))
}

fn collector_options(server: &Server) -> TransportOptions {
    let (host, port) = collector_address(server);
    TransportOptions::new(host, port)
}

/// Accepts one connection and returns everything the sink sent before closing.
async fn tcp_collector() -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("unable to bind TCP listener");
    let port = listener.local_addr().expect("no local addr").port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept failed");
        let mut received = Vec::new();
        socket
            .read_to_end(&mut received)
            .await
            .expect("read failed");
        received
    });
    (port, handle)
}

fn documents(bytes: &[u8]) -> Vec<Value> {
    serde_json::Deserializer::from_slice(bytes)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("collector received malformed JSON")
}

#[tokio::test]
async fn http_sink_posts_one_envelope_per_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-type", "application/json; charset=utf-8")
        .match_body(Matcher::PartialJson(json!({
            "@timestamp": "2023-11-14T22:13:20.000Z",
            "@version": 1,
            "level": "info",
            "message": "hello",
            "hostname": "h1",
            "logger": "svc",
            "process": 42
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let mut sink = HttpSink::new(collector_options(&server)).expect("failed to build sink");
    sink.write(RECORD.as_bytes())
        .await
        .expect("record should be delivered");

    mock.assert_async().await;
}

#[tokio::test]
async fn http_sink_sends_exact_body_and_length() {
    let options = TransportOptions::new("127.0.0.1", 1).with_attribute("service", "billing");
    let expected = envelope::build(
        &RawRecord::parse_str(RECORD).expect("valid record"),
        &options,
        None,
    )
    .to_vec()
    .expect("serializable envelope");
    let expected = String::from_utf8(expected).expect("utf-8 body");

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("content-length", expected.len().to_string().as_str())
        .match_body(expected.as_str())
        .with_status(201)
        .create_async()
        .await;

    let (host, port) = collector_address(&server);
    let options = TransportOptions {
        host,
        port,
        ..options
    };
    let mut sink = HttpSink::new(options)
        .expect("failed to build sink")
        .with_resolver(Arc::new(NoopResolver));
    sink.write_str(RECORD).await.expect("record should be delivered");

    mock.assert_async().await;
}

#[tokio::test]
async fn http_sink_adds_basic_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Basic YTpi")
        .with_status(200)
        .create_async()
        .await;

    let options = collector_options(&server).with_credentials("a", "b");
    let mut sink = HttpSink::new(options).expect("failed to build sink");
    sink.write(RECORD.as_bytes())
        .await
        .expect("record should be delivered");

    mock.assert_async().await;
}

#[tokio::test]
async fn http_sink_omits_auth_without_password() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .create_async()
        .await;

    let mut options = collector_options(&server);
    options.username = Some("a".to_string());
    let mut sink = HttpSink::new(options).expect("failed to build sink");
    sink.write(RECORD.as_bytes())
        .await
        .expect("record should be delivered");

    mock.assert_async().await;
}

#[tokio::test]
async fn http_sink_malformed_record_issues_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let mut sink = HttpSink::new(collector_options(&server)).expect("failed to build sink");
    let result = sink.write(b"{\"msg\": ").await;

    assert!(matches!(result, Err(SinkError::Parse(_))));
    mock.assert_async().await;
}

#[tokio::test]
async fn http_sink_reports_rejected_records() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(1)
        .create_async()
        .await;

    let mut sink = HttpSink::new(collector_options(&server)).expect("failed to build sink");
    let result = sink.write(RECORD.as_bytes()).await;

    match result {
        Err(SinkError::Delivery(DeliveryError::Rejected(status))) => {
            assert_eq!(status.as_u16(), 500)
        }
        other => panic!("expected rejected delivery, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn http_sink_reports_transport_errors_and_keeps_going() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let port = listener.local_addr().expect("no local addr").port();
    drop(listener);

    let mut sink =
        HttpSink::new(TransportOptions::new("127.0.0.1", port)).expect("failed to build sink");

    for _ in 0..2 {
        let result = sink.write(RECORD.as_bytes()).await;
        assert!(matches!(
            result,
            Err(SinkError::Delivery(DeliveryError::Request(_)))
        ));
    }
}

#[tokio::test]
async fn tcp_sink_preserves_write_order() {
    let (port, collector) = tcp_collector().await;

    let mut sink = TcpSink::connect(TransportOptions::new("127.0.0.1", port))
        .await
        .expect("failed to connect");
    sink.write_str(r#"{"time":0,"level":30,"msg":"first"}"#)
        .await
        .expect("first write failed");
    sink.write_str(r#"{"time":1,"level":40,"msg":"second"}"#)
        .await
        .expect("second write failed");
    sink.close().await.expect("close failed");

    let received = timeout(Duration::from_secs(5), collector)
        .await
        .expect("collector timed out")
        .expect("collector panicked");
    assert!(!received.contains(&b'\n'));

    let docs = documents(&received);
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["message"], "first");
    assert_eq!(docs[0]["level"], "info");
    assert_eq!(docs[1]["message"], "second");
    assert_eq!(docs[1]["level"], "warn");
    assert_eq!(docs[1]["@timestamp"], "1970-01-01T00:00:00.001Z");
}

#[tokio::test]
async fn tcp_sink_newline_framing() {
    let (port, collector) = tcp_collector().await;

    let options =
        TransportOptions::new("127.0.0.1", port).with_framing(Framing::NewlineDelimited);
    let mut sink = TcpSink::connect(options)
        .await
        .expect("failed to connect")
        .with_resolver(Arc::new(NoopResolver));
    sink.write_str(r#"{"msg":"a"}"#).await.expect("write failed");
    sink.write_str(r#"{"msg":"b"}"#).await.expect("write failed");
    sink.close().await.expect("close failed");

    let received = timeout(Duration::from_secs(5), collector)
        .await
        .expect("collector timed out")
        .expect("collector panicked");
    let text = String::from_utf8(received).expect("utf-8");
    let lines: Vec<Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("one document per line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["message"], "a");
    assert_eq!(lines[0]["file"], json!({}));
    assert_eq!(lines[1]["message"], "b");
    assert!(text.ends_with('\n'));
}

#[tokio::test]
async fn tcp_sink_skips_malformed_records() {
    let (port, collector) = tcp_collector().await;

    let mut sink = TcpSink::connect(TransportOptions::new("127.0.0.1", port))
        .await
        .expect("failed to connect");
    let bad = sink.write(b"<xml/>").await;
    assert!(matches!(bad, Err(SinkError::Parse(_))));
    sink.write_str(r#"{"msg":"good"}"#)
        .await
        .expect("write failed");
    sink.close().await.expect("close failed");

    let received = timeout(Duration::from_secs(5), collector)
        .await
        .expect("collector timed out")
        .expect("collector panicked");
    let docs = documents(&received);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["message"], "good");
}

#[tokio::test]
async fn tcp_sink_attributes_records_to_application_frame() {
    let (port, collector) = tcp_collector().await;

    let mut sink = TcpSink::connect(TransportOptions::new("127.0.0.1", port))
        .await
        .expect("failed to connect");
    sink.write_str(r#"{"msg":"traced"}"#)
        .await
        .expect("write failed");
    sink.close().await.expect("close failed");

    let received = timeout(Duration::from_secs(5), collector)
        .await
        .expect("collector timed out")
        .expect("collector panicked");
    let docs = documents(&received);
    let file = &docs[0]["file"];
    let function = file["function"].as_str().expect("origin has a symbol");
    assert!(function.starts_with("integration_test::"), "{function}");
    let path = file["path"].as_str().expect("origin has a source path");
    assert!(path.ends_with("integration_test.rs"), "{path}");
    assert!(file["line"].as_u64().expect("numeric line") > 0);
}

#[tokio::test]
async fn pipe_streams_records_over_tcp() {
    let (port, collector) = tcp_collector().await;

    let options = TransportOptions::new("127.0.0.1", port)
        .with_framing(Framing::NewlineDelimited)
        .with_attribute("env", "test");
    let mut sink = TcpSink::connect(options).await.expect("failed to connect");
    let input: &[u8] = b"{\"msg\":\"one\"}\n{\"msg\":\"two\"}\n{broken\n{\"msg\":\"three\"}\n";

    let stats = pipe(input, &mut sink).await.expect("pipe failed");
    sink.close().await.expect("close failed");

    assert_eq!(
        stats,
        PipeStats {
            delivered: 3,
            failed: 1
        }
    );
    let received = timeout(Duration::from_secs(5), collector)
        .await
        .expect("collector timed out")
        .expect("collector panicked");
    let messages: Vec<Value> = documents(&received)
        .into_iter()
        .map(|doc| {
            assert_eq!(doc["env"], "test");
            doc["message"].clone()
        })
        .collect();
    assert_eq!(messages, vec![json!("one"), json!("two"), json!("three")]);
}

#[tokio::test]
async fn udp_sink_sends_one_datagram_per_record() {
    let collector = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind UDP socket");
    let port = collector.local_addr().expect("no local addr").port();

    let mut sink = UdpSink::connect(TransportOptions::new("127.0.0.1", port))
        .await
        .expect("failed to connect");
    sink.write(RECORD.as_bytes()).await.expect("send failed");

    let mut buf = [0u8; 8192];
    let (len, _) = timeout(Duration::from_secs(5), collector.recv_from(&mut buf))
        .await
        .expect("collector timed out")
        .expect("recv failed");
    let doc: Value = serde_json::from_slice(&buf[..len]).expect("one JSON document");
    assert_eq!(doc["message"], "hello");
    assert_eq!(doc["level"], "info");
    assert_eq!(doc["@version"], 1);
}
