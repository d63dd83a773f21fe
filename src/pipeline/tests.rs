//! End-to-end capture over a loopback socket

use super::*;
use crate::packet::{HEADER_SIZE, PacketId};
use crate::sink::MemorySink;
use crate::test_utils::{self, SESSION_UID};
use crate::types::Measurement;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::net::UdpSocket;

const DRIVERS: [&str; 2] = ["Lewis Hamilton", "Valtteri Bottas"];
const ZONES: u8 = 3;

/// Interval long enough that only the shutdown flush ever runs
fn config(interval_secs: f64) -> CaptureConfig {
    CaptureConfig {
        port: 0,
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        interval_secs,
        ..Default::default()
    }
}

async fn send_all(capture: &Capture, packets: &[Vec<u8>]) {
    let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    for packet in packets {
        sender.send_to(packet, capture.local_addr()).await.unwrap();
    }
    tokio::time::timeout(Duration::from_secs(2), async {
        while capture.pending() < packets.len() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listener should queue every datagram");
}

#[tokio::test]
async fn participants_then_session_then_motion() {
    let sink = Arc::new(MemorySink::new());
    let capture = Capture::start(&config(60.0), sink.clone()).unwrap();

    send_all(&capture, &[
        test_utils::participants_packet(SESSION_UID, &DRIVERS),
        test_utils::session_packet(SESSION_UID, 10, 0, ZONES),
        test_utils::blank_packet(PacketId::Motion, SESSION_UID),
    ])
    .await;
    let stats = capture.shutdown().await.unwrap();

    assert_eq!(stats.flushes, 1);
    assert_eq!(stats.packets, 3);

    // one write per packet type, in arrival order
    let batches = sink.batches();
    assert_eq!(batches.len(), 2);

    let session = &batches[0];
    assert_eq!(session.len(), usize::from(ZONES) + 1);
    assert!(session[..3].iter().all(|r| r.measurement == Measurement::MarshalZones));
    assert_eq!(session[3].measurement, Measurement::SessionData);

    let motion = &batches[1];
    assert_eq!(motion.len(), DRIVERS.len() + 1);
    assert_eq!(motion[0].driver(), Some(DRIVERS[0]));
    assert_eq!(motion[1].driver(), Some(DRIVERS[1]));
    assert_eq!(motion[2].measurement, Measurement::MyMotionData);

    assert!(sink.records_of(Measurement::ParticipantData).is_empty());
}

#[tokio::test]
async fn session_then_participants_then_motion() {
    let sink = Arc::new(MemorySink::new());
    let capture = Capture::start(&config(60.0), sink.clone()).unwrap();

    send_all(&capture, &[
        test_utils::session_packet(SESSION_UID, 10, 0, ZONES),
        test_utils::participants_packet(SESSION_UID, &DRIVERS),
        test_utils::blank_packet(PacketId::Motion, SESSION_UID),
    ])
    .await;
    let stats = capture.shutdown().await.unwrap();

    assert_eq!(stats.flushes, 1);
    // not ready until the roster exists, so only MOTION produces records
    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), DRIVERS.len() + 1);
    assert!(sink.records_of(Measurement::SessionData).is_empty());
    assert!(sink.records_of(Measurement::ParticipantData).is_empty());
}

#[tokio::test]
async fn short_datagram_is_dropped_and_capture_continues() {
    let sink = Arc::new(MemorySink::new());
    let capture = Capture::start(&config(60.0), sink.clone()).unwrap();

    let mut short = test_utils::participants_packet(SESSION_UID, &DRIVERS);
    short.truncate(HEADER_SIZE - 1);

    send_all(&capture, &[
        test_utils::participants_packet(SESSION_UID, &DRIVERS),
        test_utils::session_packet(SESSION_UID, 10, 0, 0),
        short,
        test_utils::car_telemetry_packet(SESSION_UID, &[[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]),
    ])
    .await;
    let stats = capture.shutdown().await.unwrap();

    assert_eq!(stats.rejected.too_short, 1);
    assert_eq!(stats.rejected.total(), 1);
    assert_eq!(stats.packets, 3);

    let telemetry = sink.records_of(Measurement::CarTelemetryData);
    assert_eq!(telemetry.len(), 2);
    let fields = &telemetry[1].fields;
    assert_eq!(fields.get("tyresPressure_RL").and_then(|v| v.as_f64()), Some(5.0));
    assert_eq!(fields.get("tyresPressure_FR").and_then(|v| v.as_f64()), Some(8.0));
    assert!(!fields.contains("tyresPressure"));
}

#[tokio::test]
async fn idle_ticks_make_no_sink_calls() {
    let sink = Arc::new(MemorySink::new());
    let capture = Capture::start(&config(0.05), sink.clone()).unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let stats = capture.shutdown().await.unwrap();

    assert!(stats.idle_ticks >= 1);
    assert_eq!(stats.flushes, 0);
    assert_eq!(sink.attempts(), 0);
}

#[tokio::test]
async fn failed_listener_still_gets_final_flush() {
    let sink = Arc::new(MemorySink::new());
    let capture = Capture::start(&config(60.0), sink.clone()).unwrap();

    send_all(&capture, &[
        test_utils::participants_packet(SESSION_UID, &DRIVERS),
        test_utils::session_packet(SESSION_UID, 10, 0, 0),
        test_utils::blank_packet(PacketId::LapData, SESSION_UID),
    ])
    .await;
    capture.abort_listener();

    let queue = Arc::clone(&capture.queue);
    let err = capture.shutdown().await.unwrap_err();
    assert!(matches!(err, CaptureError::Join { worker: "listener", .. }));

    // the queued datagrams were still flushed
    assert!(queue.is_empty());
    assert_eq!(sink.records_of(Measurement::SessionData).len(), 1);
    assert_eq!(sink.records_of(Measurement::LapData).len(), DRIVERS.len());
}

#[tokio::test]
async fn invalid_config_is_rejected_before_binding() {
    let sink = Arc::new(MemorySink::new());
    let result = Capture::start(&config(0.0), sink);
    assert!(matches!(result, Err(CaptureError::Config { .. })));
}
