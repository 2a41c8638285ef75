//! Transport lifecycle, pipeline and drain tests.

mod common;

use std::time::Duration;

use common::{
    Accepted, DuplexConnector, FailingConnector, GatedConnector, PendingConnector, init_tracing,
    within,
};
use eio_tcp_transport::socket::wire;
use eio_tcp_transport::{
    Capabilities, ConnectionDescriptor, DrainPolicy, EngineIoCodec, Error, Frame, Packet,
    PacketEncoder, PacketType, ReadyState, TcpTransport, Transport, TransportEvent,
    TransportEvents, TransportOptions,
};
use proptest::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const MAX: usize = 1024 * 1024;

// ============================================================================
// Helpers
// ============================================================================

async fn open_duplex(
    options: TransportOptions,
) -> (TcpTransport<DuplexConnector>, TransportEvents, Accepted) {
    init_tracing();

    let (connector, mut accepted) = DuplexConnector::new();
    let (transport, mut events) =
        TcpTransport::with_connector(options, connector).expect("valid options");

    transport.open().expect("open");
    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Open)
    ));
    let accepted = within(accepted.recv()).await.expect("accepted");

    (transport, events, accepted)
}

/// Lets spawned tasks run, then asserts no event is queued.
async fn assert_quiet(events: &mut TransportEvents) {
    tokio::time::sleep(Duration::from_millis(20)).await;
    if let Some(event) = events.try_recv() {
        panic!("unexpected event: {event:?}");
    }
}

struct RejectingEncoder;

impl PacketEncoder for RejectingEncoder {
    fn encode(&self, packet: &Packet, supports_binary: bool) -> eio_tcp_transport::Result<Frame> {
        if packet.kind == PacketType::Noop {
            return Err(Error::protocol("noop not allowed"));
        }
        EngineIoCodec.encode(packet, supports_binary)
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_connect_error_fires_one_error_and_no_open() {
    init_tracing();

    let connector = FailingConnector { message: "boom" };
    let (transport, mut events) =
        TcpTransport::with_connector(TransportOptions::new("h"), connector).unwrap();

    transport.open().unwrap();
    assert_eq!(transport.ready_state(), ReadyState::Opening);

    match within(events.recv()).await {
        Some(TransportEvent::Error(Error::Connection { message })) => assert_eq!(message, "boom"),
        other => panic!("unexpected event: {other:?}"),
    }

    assert_quiet(&mut events).await;
    assert_eq!(transport.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn test_close_before_connect_completes() {
    init_tracing();

    let (connector, gate, mut accepted) = GatedConnector::new();
    let (transport, mut events) =
        TcpTransport::with_connector(TransportOptions::new("h"), connector).unwrap();

    transport.open().unwrap();
    transport.close().unwrap();

    assert!(matches!(events.try_recv(), Some(TransportEvent::Close)));
    assert_eq!(transport.ready_state(), ReadyState::Closed);

    gate.send(()).unwrap();
    let Accepted { mut server, .. } = within(accepted.recv()).await.unwrap();

    // The late stream is dropped without a handle.
    let mut buf = Vec::new();
    within(server.read_to_end(&mut buf)).await.unwrap();
    assert!(buf.is_empty());

    assert_quiet(&mut events).await;
    assert_eq!(transport.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn test_close_while_connect_pending() {
    let (transport, mut events) =
        TcpTransport::with_connector(TransportOptions::new("h"), PendingConnector).unwrap();

    transport.open().unwrap();
    transport.close().unwrap();
    transport.close().unwrap();

    assert!(matches!(events.try_recv(), Some(TransportEvent::Close)));
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_open_rejected_unless_idle() {
    let (transport, mut events) = TcpTransport::with_connector(
        TransportOptions::new("h"),
        FailingConnector { message: "down" },
    )
    .unwrap();

    transport.open().unwrap();
    let _ = within(events.recv()).await;

    let err = transport.open().unwrap_err();
    assert!(err.is_lifecycle_error());
    assert_eq!(err.to_string(), "Cannot open while transport is closed");
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (transport, mut events, Accepted { mut server, .. }) =
        open_duplex(TransportOptions::new("h")).await;

    transport.close().unwrap();
    transport.close().unwrap();
    assert_eq!(transport.ready_state(), ReadyState::Closing);

    // Write side shut down exactly once.
    let mut buf = Vec::new();
    within(server.read_to_end(&mut buf)).await.unwrap();
    assert!(buf.is_empty());

    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Close)
    ));
    assert_eq!(transport.ready_state(), ReadyState::Closed);

    transport.close().unwrap();
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_remote_end_fires_close() {
    let (transport, mut events, accepted) = open_duplex(TransportOptions::new("h")).await;

    drop(accepted.server);

    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Close)
    ));
    assert_eq!(transport.ready_state(), ReadyState::Closed);
    assert!(!transport.is_writable());
}

#[tokio::test]
async fn test_socket_error_fires_error() {
    let options = TransportOptions::new("h").with_max_frame_size(8);
    let (transport, mut events, Accepted { mut server, .. }) = open_duplex(options).await;

    wire::write_text(&mut server, "4far too long").await.unwrap();

    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Error(Error::FrameTooLarge { size: 13, max: 8 }))
    ));
    assert_eq!(transport.ready_state(), ReadyState::Closed);
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_inbound_frames_pass_through_raw() {
    let (_transport, mut events, Accepted { mut server, .. }) =
        open_duplex(TransportOptions::new("h")).await;

    wire::write_text(&mut server, "4hi").await.unwrap();
    wire::write_vectored(&mut server, &[vec![4], vec![1, 2]])
        .await
        .unwrap();

    let Some(TransportEvent::Data(text)) = within(events.recv()).await else {
        panic!("expected text data");
    };
    assert_eq!(text, Frame::Text("4hi".into()));
    assert_eq!(EngineIoCodec.decode(&text).unwrap(), Packet::message("hi"));

    let Some(TransportEvent::Data(binary)) = within(events.recv()).await else {
        panic!("expected binary data");
    };
    assert_eq!(binary, Frame::binary(vec![4, 1, 2]));
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_batch_written_in_order_then_drains() {
    let (transport, mut events, Accepted { mut server, .. }) =
        open_duplex(TransportOptions::new("h")).await;

    transport
        .write(vec![Packet::message("a"), Packet::message("b")])
        .unwrap();
    assert!(!transport.is_writable());

    let first = wire::read_frame(&mut server, MAX).await.unwrap();
    let second = wire::read_frame(&mut server, MAX).await.unwrap();
    assert_eq!(first, Some(Frame::Text("4a".into())));
    assert_eq!(second, Some(Frame::Text("4b".into())));

    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Drain)
    ));
    assert!(transport.is_writable());
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_binary_packet_uses_vectored_write() {
    let (transport, mut events, Accepted { mut server, .. }) =
        open_duplex(TransportOptions::new("h")).await;

    transport
        .write(vec![Packet::binary_message(vec![9, 8, 7])])
        .unwrap();

    let frame = wire::read_frame(&mut server, MAX).await.unwrap();
    assert_eq!(frame, Some(Frame::binary(vec![4, 9, 8, 7])));
    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Drain)
    ));
}

#[tokio::test]
async fn test_force_base64_sends_text() {
    let options = TransportOptions::new("h").with_force_base64();
    let (transport, _events, Accepted { descriptor, mut server }) = open_duplex(options).await;

    assert!(!transport.supports_binary());
    assert!(!descriptor.binary_frames);
    assert!(descriptor.query().contains("b64=1"));

    transport
        .write(vec![Packet::binary_message(vec![1, 2, 3])])
        .unwrap();

    let frame = wire::read_frame(&mut server, MAX).await.unwrap();
    assert_eq!(frame, Some(Frame::Text("b4AQID".into())));
}

#[tokio::test]
async fn test_per_frame_policy_drains_every_frame() {
    let options = TransportOptions::new("h").with_drain_policy(DrainPolicy::PerFrame);
    let (transport, mut events, _accepted) = open_duplex(options).await;

    transport
        .write(vec![Packet::ping(), Packet::message("x"), Packet::close()])
        .unwrap();

    for _ in 0..3 {
        assert!(matches!(
            within(events.recv()).await,
            Some(TransportEvent::Drain)
        ));
    }
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_empty_batch_drains_immediately() {
    let (transport, mut events, _accepted) = open_duplex(TransportOptions::new("h")).await;

    transport.write(Vec::new()).unwrap();

    assert!(matches!(events.try_recv(), Some(TransportEvent::Drain)));
    assert!(transport.is_writable());
    assert_quiet(&mut events).await;
}

#[tokio::test]
async fn test_write_rejected_while_not_writable() {
    let (transport, _events, _accepted) = open_duplex(TransportOptions::new("h")).await;

    transport.write(vec![Packet::message("a")]).unwrap();
    let err = transport.write(vec![Packet::message("b")]).unwrap_err();
    assert!(matches!(err, Error::NotWritable));
}

#[tokio::test]
async fn test_write_rejected_unless_open() {
    let (transport, _events) =
        TcpTransport::with_connector(TransportOptions::new("h"), PendingConnector).unwrap();

    transport.open().unwrap();
    let err = transport.write(vec![Packet::message("a")]).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState {
            operation: "write",
            state: ReadyState::Opening
        }
    ));
}

#[tokio::test]
async fn test_encode_failure_rejects_whole_batch() {
    init_tracing();

    let (connector, mut accepted) = DuplexConnector::new();
    let (transport, mut events) =
        TcpTransport::with_connector(TransportOptions::new("h"), connector).unwrap();
    let transport = transport.with_encoder(RejectingEncoder);

    transport.open().unwrap();
    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Open)
    ));
    let Accepted { mut server, .. } = within(accepted.recv()).await.unwrap();

    let err = transport
        .write(vec![Packet::message("a"), Packet::new(PacketType::Noop)])
        .unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }));
    assert!(transport.is_writable());

    // Nothing from the rejected batch reached the wire.
    transport.write(vec![Packet::message("ok")]).unwrap();
    let frame = wire::read_frame(&mut server, MAX).await.unwrap();
    assert_eq!(frame, Some(Frame::Text("4ok".into())));
}

// ============================================================================
// TcpConnector
// ============================================================================

#[tokio::test]
async fn test_tcp_connector_end_to_end() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut head = Vec::new();
        while !head.ends_with(b"\r\n\r\n") {
            head.push(stream.read_u8().await.unwrap());
        }
        let head = String::from_utf8(head).unwrap();

        stream
            .write_all(
                b"HTTP/1.1 101 Switching Protocols\r\n\
                  Connection: Upgrade\r\n\
                  Upgrade: tcp-packets\r\n\r\n",
            )
            .await
            .unwrap();

        // Echo one frame back.
        let frame = wire::read_frame(&mut stream, MAX).await.unwrap().unwrap();
        let text = frame.as_text().unwrap().to_owned();
        wire::write_text(&mut stream, &text).await.unwrap();

        head
    });

    let options = TransportOptions::new("127.0.0.1")
        .with_port(port)
        .with_query("sid", "abc")
        .with_header("X-Token", "t");
    let (transport, mut events) = TcpTransport::new(options).unwrap();

    transport.open().unwrap();
    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Open)
    ));

    transport.write(vec![Packet::message("echo")]).unwrap();

    let mut drained = false;
    let mut echoed = false;
    while !(drained && echoed) {
        match within(events.recv()).await {
            Some(TransportEvent::Drain) => drained = true,
            Some(TransportEvent::Data(frame)) => {
                assert_eq!(frame, Frame::Text("4echo".into()));
                echoed = true;
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    let head = within(server).await.unwrap();
    assert!(head.starts_with("GET /engine.io/?sid=abc HTTP/1.1\r\n"));
    assert!(head.contains("Upgrade: tcp-packets\r\n"));
    assert!(head.contains("X-Token: t\r\n"));

    transport.close().unwrap();
    assert!(matches!(
        within(events.recv()).await,
        Some(TransportEvent::Close)
    ));
}

#[tokio::test]
async fn test_tcp_connector_refused_fires_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (transport, mut events) =
        TcpTransport::new(TransportOptions::new("127.0.0.1").with_port(port)).unwrap();
    transport.open().unwrap();

    match within(events.recv()).await {
        Some(TransportEvent::Error(e)) => assert!(e.is_connection_error()),
        other => panic!("unexpected event: {other:?}"),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_frames_follow_input_order(texts in prop::collection::vec("[a-z0-9]{0,12}", 1..8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let frames = runtime.block_on(async {
            let (transport, mut events, Accepted { mut server, .. }) =
                open_duplex(TransportOptions::new("h")).await;

            let packets = texts.iter().map(|t| Packet::message(t.as_str())).collect();
            transport.write(packets).unwrap();

            let mut frames = Vec::new();
            for _ in 0..texts.len() {
                frames.push(wire::read_frame(&mut server, MAX).await.unwrap().unwrap());
            }
            assert!(matches!(within(events.recv()).await, Some(TransportEvent::Drain)));
            frames
        });

        let expected: Vec<Frame> = texts.iter().map(|t| Frame::Text(format!("4{t}"))).collect();
        prop_assert_eq!(frames, expected);
    }

    #[test]
    fn test_path_has_query_marker_iff_query_nonempty(
        pairs in prop::collection::vec(("[a-z]{1,6}", "[ -~]{0,6}"), 0..4),
        timestamps in any::<bool>(),
        binary in any::<bool>(),
    ) {
        let mut options = TransportOptions::new("h");
        for (key, value) in pairs {
            options = options.with_query(key, value);
        }
        if timestamps {
            options = options.with_timestamp_requests();
        }

        let capabilities = if binary {
            Capabilities::binary()
        } else {
            Capabilities::text_only()
        };
        let descriptor =
            ConnectionDescriptor::build_with_nonce(&options, capabilities, || "N0nce".to_owned());

        let has_query = !descriptor.query().is_empty();
        prop_assert_eq!(descriptor.path.contains('?'), has_query);
        prop_assert!(!descriptor.path.contains("??"));
        prop_assert!(descriptor.path.starts_with("/engine.io/"));
    }
}
