//! Link tests — supervisor lifecycle over a real TCP connection on
//! localhost: announce ordering, event forwarding, and reconnection.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use reel_core::network::{Backoff, ConnectionInfo, LinkEvent, Supervisor};
use reel_core::protocol::{Command, Event};

// ── Helpers ──────────────────────────────────────────────────────

/// Spin up a listener on an OS-assigned port and return the connection
/// info. The listener is returned so the caller can accept on it.
async fn ephemeral_listener() -> (TcpListener, ConnectionInfo) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let info = ConnectionInfo::new(addr.ip().to_string(), addr.port());
    (listener, info)
}

/// Fast backoff so reconnect tests finish quickly.
fn test_backoff() -> Backoff {
    Backoff::new(Duration::from_millis(20), Duration::from_millis(100))
}

/// Accept one connection and wrap its read side for line-based asserts.
async fn accept(listener: &TcpListener) -> (BufReader<tokio::net::tcp::OwnedReadHalf>, tokio::net::tcp::OwnedWriteHalf) {
    let (stream, _) = listener.accept().await.unwrap();
    let (read, write) = stream.into_split();
    (BufReader::new(read), write)
}

async fn read_json(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> Value {
    let mut line = String::new();
    let n = tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("timeout reading line")
        .unwrap();
    assert!(n > 0, "peer closed before a line arrived");
    serde_json::from_str(&line).unwrap()
}

async fn next_link_event(rx: &mut tokio::sync::mpsc::Receiver<LinkEvent>) -> LinkEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for link event")
        .expect("supervisor ended")
}

// ── Announce ordering ────────────────────────────────────────────

#[tokio::test]
async fn announce_is_first_message_on_open() {
    let (listener, info) = ephemeral_listener().await;
    let (supervisor, handle, mut link_rx) = Supervisor::new(info, Command::Control, test_backoff());
    tokio::spawn(supervisor.run());

    // Queue a command before the connection even exists; it must still
    // trail the announce.
    handle.send(Command::Refresh);

    let (mut reader, _write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "control"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);
    assert_eq!(read_json(&mut reader).await, json!({"command": "refresh"}));
}

// ── Event forwarding ─────────────────────────────────────────────

#[tokio::test]
async fn inbound_events_reach_the_consumer_in_order() {
    let (listener, info) = ephemeral_listener().await;
    let (supervisor, _handle, mut link_rx) = Supervisor::new(info, Command::Monitor, test_backoff());
    tokio::spawn(supervisor.run());

    let (mut reader, mut write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "monitor"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);

    write
        .write_all(b"{\"response\": \"clip_count\", \"params\": {\"count\": 2}}\n")
        .await
        .unwrap();
    write
        .write_all(b"{\"response\": \"request_error\", \"params\": {\"message\": \"deck unreachable\"}}\n")
        .await
        .unwrap();

    assert_eq!(
        next_link_event(&mut link_rx).await,
        LinkEvent::Inbound(Event::ClipCount { count: 2 })
    );
    assert_eq!(
        next_link_event(&mut link_rx).await,
        LinkEvent::Inbound(Event::RequestError {
            message: "deck unreachable".into()
        })
    );
}

#[tokio::test]
async fn outbound_commands_arrive_as_lines() {
    let (listener, info) = ephemeral_listener().await;
    let (supervisor, handle, mut link_rx) = Supervisor::new(info, Command::Control, test_backoff());
    tokio::spawn(supervisor.run());

    let (mut reader, _write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "control"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);

    handle.send(Command::ClipSelect { id: 3 });
    handle.send(Command::Stop);

    assert_eq!(
        read_json(&mut reader).await,
        json!({"command": "clip_select", "params": {"id": 3}})
    );
    assert_eq!(read_json(&mut reader).await, json!({"command": "stop"}));
}

// ── Reconnection ─────────────────────────────────────────────────

#[tokio::test]
async fn peer_drop_is_reported_and_reconnected() {
    let (listener, info) = ephemeral_listener().await;
    let (supervisor, _handle, mut link_rx) = Supervisor::new(info, Command::Monitor, test_backoff());
    tokio::spawn(supervisor.run());

    let (mut reader, write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "monitor"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);

    // Kill the server side of the connection.
    drop(write);
    drop(reader);

    assert!(matches!(
        next_link_event(&mut link_rx).await,
        LinkEvent::Closed { .. }
    ));

    // The supervisor reconnects on its own and re-announces.
    let (mut reader, _write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "monitor"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);
}

#[tokio::test]
async fn reset_request_forces_a_fresh_session() {
    let (listener, info) = ephemeral_listener().await;
    let (supervisor, handle, mut link_rx) = Supervisor::new(info, Command::Control, test_backoff());
    tokio::spawn(supervisor.run());

    let (mut reader, _write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "control"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);

    handle.reset_link();

    assert_eq!(
        next_link_event(&mut link_rx).await,
        LinkEvent::Closed {
            reason: "reset requested".into()
        }
    );

    let (mut reader, _write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "control"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);
}

#[tokio::test]
async fn connect_retries_until_a_listener_appears() {
    // Reserve a port, then close the listener so the first attempts fail.
    let (listener, info) = ephemeral_listener().await;
    drop(listener);

    let (supervisor, _handle, mut link_rx) =
        Supervisor::new(info.clone(), Command::Monitor, test_backoff());
    tokio::spawn(supervisor.run());

    // Let a few attempts fail before the port comes back.
    tokio::time::sleep(Duration::from_millis(60)).await;
    let listener = TcpListener::bind(info.socket_string()).await.unwrap();

    let (mut reader, _write) = accept(&listener).await;
    assert_eq!(read_json(&mut reader).await, json!({"command": "monitor"}));
    assert_eq!(next_link_event(&mut link_rx).await, LinkEvent::Open);
}
