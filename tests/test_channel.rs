//! Unit tests for `LineChannel`
//!
//! Tests line framing, timeouts and end-of-stream handling over mock I/O

use std::time::Duration;

use kernel_build_client::transport::{Inbound, LineChannel};
use kernel_build_client::BuildClientError;
use tokio_test::io::Builder;

#[tokio::test]
async fn test_write_appends_newline() {
    let reader = Builder::new().build();
    let writer = Builder::new().write(b"START {\"op\":\"add\"}\n").build();
    let mut channel = LineChannel::new(reader, writer, 1024, Duration::from_secs(1));

    channel.write_line("START {\"op\":\"add\"}").await.unwrap();
}

#[tokio::test]
async fn test_read_reassembles_partial_lines() {
    let reader = Builder::new()
        .read(b"noise[~]AC")
        .read(b"K\n[~]True\r\n")
        .build();
    let writer = Builder::new().build();
    let mut channel = LineChannel::new(reader, writer, 1024, Duration::from_secs(1));

    assert_eq!(
        channel.read_line().await.unwrap(),
        Inbound::Line("noise[~]ACK".to_string())
    );
    assert_eq!(
        channel.read_line().await.unwrap(),
        Inbound::Line("[~]True".to_string())
    );
}

#[tokio::test]
async fn test_eof_is_reported_as_closed() {
    let reader = Builder::new().read(b"[~]last\n").build();
    let writer = Builder::new().build();
    let mut channel = LineChannel::new(reader, writer, 1024, Duration::from_secs(1));

    assert_eq!(
        channel.read_line().await.unwrap(),
        Inbound::Line("[~]last".to_string())
    );
    assert_eq!(channel.read_line().await.unwrap(), Inbound::Closed);
}

#[tokio::test]
async fn test_oversized_line_is_rejected() {
    let reader = Builder::new().read(b"[~]0123456789abcdef\n").build();
    let writer = Builder::new().build();
    let mut channel = LineChannel::new(reader, writer, 8, Duration::from_secs(1));

    assert!(matches!(
        channel.read_line().await,
        Err(BuildClientError::Transport(_))
    ));
}

#[tokio::test]
async fn test_silence_reports_timeout() {
    let (ours, theirs) = tokio::io::duplex(256);
    let (read_half, write_half) = tokio::io::split(ours);
    let mut channel = LineChannel::new(read_half, write_half, 1024, Duration::from_millis(50));

    assert_eq!(channel.read_line().await.unwrap(), Inbound::TimedOut);

    // A line arriving later is still delivered intact
    let (_, mut their_write) = tokio::io::split(theirs);
    tokio::io::AsyncWriteExt::write_all(&mut their_write, b"[~]late\n")
        .await
        .unwrap();
    channel.set_timeout(Duration::from_secs(1));
    assert_eq!(
        channel.read_line().await.unwrap(),
        Inbound::Line("[~]late".to_string())
    );
}
