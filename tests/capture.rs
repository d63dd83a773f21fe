//! Public API smoke tests: a capture over loopback fed with datagrams the
//! decoder must reject

use pitlane::{CaptureConfig, MemorySink, Pitlane};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

fn loopback_config() -> CaptureConfig {
    CaptureConfig {
        port: 0,
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        interval_secs: 0.1,
        ..Default::default()
    }
}

/// 23 byte header with the given format, packet version and id
fn header(format: u16, version: u8, id: u8) -> Vec<u8> {
    let mut data = vec![0u8; 23];
    data[0..2].copy_from_slice(&format.to_le_bytes());
    data[2] = 1;
    data[4] = version;
    data[5] = id;
    data
}

#[tokio::test]
async fn malformed_datagrams_are_counted_not_written() {
    let sink = Arc::new(MemorySink::new());
    let capture = Pitlane::start_with_sink(&loopback_config(), sink.clone()).unwrap();
    let addr = capture.local_addr();

    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    // shorter than a header
    sender.send_to(&[0u8; 22], addr).await.unwrap();
    // F1 2018 format
    sender.send_to(&header(2018, 1, 0), addr).await.unwrap();
    // EVENT header padded to the wrong length
    let mut event = header(2019, 1, 3);
    event.resize(40, 0);
    sender.send_to(&event, addr).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let stats = capture.shutdown().await.unwrap();

    assert_eq!(stats.rejected.too_short, 1);
    assert_eq!(stats.rejected.unrecognized, 1);
    assert_eq!(stats.rejected.size_mismatch, 1);
    assert_eq!(stats.packets, 0);
    assert_eq!(sink.attempts(), 0);
}

#[tokio::test]
async fn yaml_config_drives_capture() {
    let config = CaptureConfig::from_yaml_str("bind_address: 127.0.0.1\nport: 0\ninterval_secs: 0.05\n").unwrap();
    let sink = Arc::new(MemorySink::new());
    let capture = Pitlane::start_with_sink(&config, sink).unwrap();

    assert!(capture.local_addr().ip().is_loopback());
    assert_ne!(capture.local_addr().port(), 0);

    let stats = capture.shutdown().await.unwrap();
    assert_eq!(stats.flushes, 0);
}
