use super::*;
use ferry_config::SenderConfig;
use ferry_encode::PlainEncoder;
use ferry_sender::{Event, Sender};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

// =============================================================================
// Config tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = TcpSinkConfig::new("localhost:9000");
    assert_eq!(config.target, "localhost:9000");
    assert_eq!(config.connection_timeout, Duration::from_secs(10));
    assert_eq!(config.write_timeout, Duration::from_secs(5));
}

#[test]
fn test_config_builders() {
    let config = TcpSinkConfig::new("localhost:9000")
        .with_connection_timeout(Duration::from_secs(1))
        .with_write_timeout(Duration::from_millis(500));

    assert_eq!(config.connection_timeout, Duration::from_secs(1));
    assert_eq!(config.write_timeout, Duration::from_millis(500));
}

#[test]
fn test_capabilities_are_batch_only() {
    let sink = TcpSink::new(TcpSinkConfig::new("localhost:9000"));
    let caps = sink.capabilities();
    assert!(caps.batching);
    assert!(caps.batch_only);
}

// =============================================================================
// Delivery tests (through a full sender)
// =============================================================================

async fn read_frame(stream: &mut tokio::net::TcpStream) -> Vec<u8> {
    let mut prefix = [0u8; 4];
    stream.read_exact(&mut prefix).await.unwrap();
    let len = u32::from_be_bytes(prefix) as usize;
    let mut frame = vec![0u8; len];
    stream.read_exact(&mut frame).await.unwrap();
    frame
}

#[tokio::test]
async fn test_batch_arrives_as_one_length_prefixed_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let sink = Arc::new(TcpSink::new(TcpSinkConfig::new(addr.to_string())));
    let (tx, rx) = mpsc::channel(16);
    let sender = Sender::builder("tcp_test", sink.clone())
        .config(SenderConfig::default().with_batch_size(3).with_workers(1))
        .encoder(Arc::new(PlainEncoder::default()))
        .start(rx)
        .unwrap();

    for payload in ["one", "two", "three"] {
        tx.send(Event::new(payload)).await.unwrap();
    }

    let (mut accepted, _) = listener.accept().await.unwrap();
    let frame = read_frame(&mut accepted).await;
    assert_eq!(frame, b"one\ntwo\nthree\n");

    sender.close().await;
    assert_eq!(sink.frames_sent(), 1);
    assert_eq!(sink.bytes_sent(), frame.len() as u64 + 4);
}

#[tokio::test]
async fn test_consecutive_batches_reuse_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let sink = Arc::new(TcpSink::new(TcpSinkConfig::new(addr.to_string())));
    let (tx, rx) = mpsc::channel(16);
    let sender = Sender::builder("tcp_test", sink.clone())
        .config(SenderConfig::default().with_batch_size(2).with_workers(1))
        .encoder(Arc::new(PlainEncoder::default()))
        .start(rx)
        .unwrap();

    for payload in ["a", "b", "c", "d"] {
        tx.send(Event::new(payload)).await.unwrap();
    }

    let (mut accepted, _) = listener.accept().await.unwrap();
    assert_eq!(read_frame(&mut accepted).await, b"a\nb\n");
    assert_eq!(read_frame(&mut accepted).await, b"c\nd\n");

    sender.close().await;
    assert_eq!(sink.frames_sent(), 2);
}

#[tokio::test]
async fn test_connection_failure_fails_the_batch() {
    // Nothing listens on the target; every flush errors out.
    let config = TcpSinkConfig::new("127.0.0.1:1")
        .with_connection_timeout(Duration::from_millis(200));
    let sink = Arc::new(TcpSink::new(config));

    let (tx, rx) = mpsc::channel(16);
    let sender = Sender::builder("tcp_test", sink)
        .config(SenderConfig::default().with_batch_size(2).with_workers(1))
        .encoder(Arc::new(PlainEncoder::default()))
        .start(rx)
        .unwrap();

    tx.send(Event::new("a")).await.unwrap();
    tx.send(Event::new("b")).await.unwrap();

    for _ in 0..400 {
        if sender.metrics().failed_send() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(sender.metrics().failed_send(), 2);
    assert_eq!(sender.metrics().sent(), 0);
    assert!(sender.metrics().sender_error_total() >= 1);
    sender.close().await;
}
