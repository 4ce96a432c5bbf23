//! 传感器读数集成测试
//!
//! 通过 mock 事件流推送状态更新，验证 Observer 读到的是最新一帧。

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thymio_sdk::driver::{MockStream, MockTransport};
use thymio_sdk::prelude::*;
use thymio_sdk::protocol::STATE_FIELD_COUNT;

const WAIT: Duration = Duration::from_secs(2);

fn connected_thymio() -> (Thymio, MockTransport, MockStream) {
    let transport = MockTransport::new();
    let stream = transport.open_stream();
    let thymio = ThymioBuilder::new()
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap();
    (thymio, transport, stream)
}

/// 按状态帧的字段下标（1 起）构造字段列表
fn state_fields(values: &[(usize, i32)]) -> Vec<i32> {
    let mut fields = vec![0; STATE_FIELD_COUNT - 1];
    for &(index, value) in values {
        fields[index - 1] = value;
    }
    fields
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_no_telemetry_reads_zero() {
    let thymio = ThymioBuilder::new()
        .transport(Arc::new(MockTransport::new()))
        .auto_connect(false)
        .build()
        .unwrap();
    let observer = thymio.observer();

    assert_eq!(observer.proximity(2), 0);
    assert_eq!(observer.proximity_horizontal_text(), "0 0 0 0 0 0 0");
    assert!(!observer.button(Button::Center));
    assert!(!observer.touching(SensorZone::Front));
    assert!(!observer.bump(0));
    assert!(observer.is_stale());
}

#[test]
fn test_buttons_from_state_update() {
    let (thymio, _transport, stream) = connected_thymio();
    stream.send_state(&state_fields(&[(2, 9)]));
    thymio.wait_for_telemetry(WAIT).unwrap();

    let observer = thymio.observer();
    assert!(observer.button(Button::Right));
    assert!(observer.button(Button::Center));
    assert!(!observer.button(Button::Left));
    assert!(!observer.button(Button::Front));
    assert!(!observer.button(Button::Back));
}

#[test]
fn test_touching_follows_latest_frame() {
    let (thymio, _transport, stream) = connected_thymio();
    let observer = thymio.observer().clone();

    stream.send_state(&state_fields(&[(17, 1100)]));
    assert!(wait_until(|| observer.touching(SensorZone::Front)));
    assert!(observer.touching_threshold(SensorZone::Left, DetectionRange::Far));
    assert!(!observer.touching_threshold(SensorZone::Left, DetectionRange::Near));

    stream.send_state(&state_fields(&[(17, 0)]));
    assert!(wait_until(|| !observer.touching(SensorZone::Front)));
    assert!(!observer.touching_threshold(SensorZone::Left, DetectionRange::Far));
}

#[test]
fn test_short_frame_is_dropped() {
    let (thymio, _transport, stream) = connected_thymio();
    stream.send_state(&state_fields(&[(17, 500)]));
    thymio.wait_for_telemetry(WAIT).unwrap();

    stream.send_data("R_state_update 1 2 3");
    let bridge = thymio.bridge().clone();
    assert!(wait_until(|| bridge.metrics().malformed_frames == 1));
    assert_eq!(thymio.observer().proximity(0), 500);
}

#[test]
fn test_event_frames_do_not_replace_state() {
    let (thymio, _transport, stream) = connected_thymio();
    stream.send_state(&state_fields(&[(13, 5), (15, 300), (16, 400)]));
    thymio.wait_for_telemetry(WAIT).unwrap();

    stream.send_data("Q_motion_started 1 2");
    let bridge = thymio.bridge().clone();
    assert!(wait_until(|| bridge.metrics().event_frames == 1));

    let observer = thymio.observer();
    assert_eq!(observer.received(), 5);
    assert_eq!(thymio.received(), 5);
    assert_eq!(observer.ground(0), 300);
    assert_eq!(observer.ground(1), 400);
}
