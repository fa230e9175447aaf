//! Datagram-to-line scenarios driven through the real executors.

use ps2bridge::device::{Keyboard, Mouse};
use ps2bridge::task::executor::Executor;
use ps2bridge::testutil::{FakeDelay, FakeTransport, ManualClock, RecordingIndicator};
use ps2bridge::Bridge;
use ps2bridge_common::{BridgeConfig, Buttons};
use ps2bridge_hal::Clock;
use ps2bridge_sdk::DatagramBuilder;

const ACK: u8 = 0xFA;

struct Rig {
    bridge: Bridge<FakeTransport, FakeDelay, FakeTransport, FakeDelay>,
    keyboard_line: FakeTransport,
    mouse_line: FakeTransport,
}

fn rig(config: BridgeConfig) -> Rig {
    let keyboard_line = FakeTransport::new();
    let mouse_line = FakeTransport::new();
    let bridge = Bridge::new(
        config,
        Keyboard::new(keyboard_line.clone(), FakeDelay::new()),
        Mouse::new(mouse_line.clone(), FakeDelay::new()),
    )
    .unwrap();
    Rig {
        bridge,
        keyboard_line,
        mouse_line,
    }
}

fn run_until(executor: &mut Executor, clock: &ManualClock, mut done: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if done() {
            return;
        }
        executor.tick(clock.now_us());
    }
    panic!("condition not reached");
}

fn run_passes(executor: &mut Executor, clock: &ManualClock, passes: usize) {
    for _ in 0..passes {
        executor.tick(clock.now_us());
    }
}

#[test]
fn test_keyboard_frame_reaches_line() {
    let rig = rig(BridgeConfig::default());
    let clock = ManualClock::stepping(100);
    let mut executor = rig
        .bridge
        .keyboard_executor(clock.clone(), RecordingIndicator::new());

    let stats = rig.bridge.ingress().handle_datagram(b"K\x02\x1C\xF0");
    assert_eq!(stats.accepted, 1);

    run_until(&mut executor, &clock, || rig.keyboard_line.written().len() == 2);
    assert_eq!(rig.keyboard_line.written(), [0x1C, 0xF0]);
    assert!(rig.bridge.keyboard().queue().is_empty());
}

#[test]
fn test_mouse_frame_after_host_enables_reporting() {
    let rig = rig(BridgeConfig::default());
    let clock = ManualClock::stepping(100);
    let mut executor = rig.bridge.mouse_executor(clock.clone());

    rig.mouse_line.host_sends(&[0xF4]);
    run_until(&mut executor, &clock, || rig.mouse_line.written() == [ACK]);
    rig.mouse_line.take_written();

    rig.bridge
        .ingress()
        .handle_datagram(&[b'M', 4, 0x08, 0x05, 0xFA, 0x00]);
    run_until(&mut executor, &clock, || rig.mouse_line.written().len() == 3);
    assert_eq!(rig.mouse_line.written(), [0x08, 0x05, 0xFA]);
}

#[test]
fn test_mouse_frame_dropped_while_reporting_disabled() {
    let rig = rig(BridgeConfig::default());
    let clock = ManualClock::stepping(100);
    let mut executor = rig.bridge.mouse_executor(clock.clone());

    rig.bridge
        .ingress()
        .handle_datagram(&[b'M', 4, 0x08, 0x05, 0xFA, 0x00]);
    run_until(&mut executor, &clock, || rig.bridge.mouse().queue().is_empty());
    run_passes(&mut executor, &clock, 50);
    assert!(rig.mouse_line.written().is_empty());
}

#[test]
fn test_full_queue_drops_newest() {
    let rig = rig(BridgeConfig::default());
    let frame = [b'M', 4, 0x08, 0x01, 0x00, 0x00];
    for _ in 0..30 {
        assert_eq!(rig.bridge.ingress().handle_datagram(&frame).accepted, 1);
    }
    let stats = rig.bridge.ingress().handle_datagram(&frame);
    assert_eq!(stats.dropped, 1);
    assert_eq!(rig.bridge.mouse().queue().len(), 30);
}

#[test]
fn test_stream_reports_are_rate_limited() {
    let mut config = BridgeConfig::default();
    config.mouse.force_reporting = true;
    let rig = rig(config);
    let clock = ManualClock::new();
    let mut executor = rig.bridge.mouse_executor(clock.clone());

    let mut datagram = DatagramBuilder::new();
    datagram.motion(1, 0, 0, Buttons::default());
    datagram.motion(2, 0, 0, Buttons::default());
    rig.bridge.ingress().handle_datagram(datagram.as_bytes());

    run_passes(&mut executor, &clock, 20);
    assert_eq!(rig.mouse_line.written(), [0x08, 0x01, 0x00]);

    // 100 reports/s: the next one may go out 10 ms after the first.
    clock.advance(9_999);
    run_passes(&mut executor, &clock, 20);
    assert_eq!(rig.mouse_line.written().len(), 3);

    clock.advance(1);
    run_passes(&mut executor, &clock, 20);
    assert_eq!(rig.mouse_line.written(), [0x08, 0x01, 0x00, 0x08, 0x02, 0x00]);
}

#[test]
fn test_held_bus_blocks_both_classes() {
    let mut config = BridgeConfig::default();
    config.mouse.force_reporting = true;
    let rig = rig(config);
    let clock = ManualClock::stepping(100);
    let mut keyboard = rig
        .bridge
        .keyboard_executor(clock.clone(), RecordingIndicator::new());
    let mut mouse = rig.bridge.mouse_executor(clock.clone());

    let mut datagram = DatagramBuilder::new();
    datagram.keys(&[0x1C]).motion(3, 0, 0, Buttons::default());

    let guard = rig.bridge.bus().try_lock().unwrap();
    rig.bridge.ingress().handle_datagram(datagram.as_bytes());
    run_passes(&mut keyboard, &clock, 50);
    run_passes(&mut mouse, &clock, 50);
    assert!(rig.keyboard_line.written().is_empty());
    assert!(rig.mouse_line.written().is_empty());

    drop(guard);
    run_until(&mut keyboard, &clock, || rig.keyboard_line.written() == [0x1C]);
    run_until(&mut mouse, &clock, || rig.mouse_line.written() == [0x08, 0x03, 0x00]);
}

#[test]
fn test_interrupted_keyboard_frame_is_resent() {
    let rig = rig(BridgeConfig::default());
    let clock = ManualClock::stepping(100);
    let mut executor = rig
        .bridge
        .keyboard_executor(clock.clone(), RecordingIndicator::new());

    rig.keyboard_line.fail_writes_after(1, 1);
    rig.bridge.ingress().handle_datagram(b"K\x02\x1C\xF0");

    run_until(&mut executor, &clock, || rig.bridge.keyboard().queue().is_empty());
    assert_eq!(rig.keyboard_line.written(), [0x1C, 0x1C, 0xF0]);
}

#[test]
fn test_led_state_reaches_indicator() {
    let rig = rig(BridgeConfig::default());
    let indicator = RecordingIndicator::new();
    let clock = ManualClock::stepping(100);
    let mut executor = rig
        .bridge
        .keyboard_executor(clock.clone(), indicator.clone());

    rig.keyboard_line.host_sends(&[0xED, 0x07]);
    run_until(&mut executor, &clock, || !indicator.history().is_empty());
    assert_eq!(indicator.history(), [0x07]);
    assert_eq!(rig.keyboard_line.written(), [ACK, ACK]);
    assert_eq!(rig.bridge.keyboard().leds(), Some(0x07));
}

#[test]
fn test_intellimouse_reports_carry_wheel() {
    let rig = rig(BridgeConfig::default());
    let clock = ManualClock::stepping(100);
    let mut executor = rig.bridge.mouse_executor(clock.clone());

    rig.mouse_line
        .host_sends(&[0xF3, 200, 0xF3, 100, 0xF3, 80, 0xF2, 0xF4]);
    run_until(&mut executor, &clock, || rig.mouse_line.pending_inbound() == 0);
    run_passes(&mut executor, &clock, 5);
    assert_eq!(
        rig.mouse_line.take_written(),
        [ACK, ACK, ACK, ACK, ACK, ACK, ACK, 0x03, ACK]
    );

    let mut datagram = DatagramBuilder::new();
    datagram.motion(0, 0, -2, Buttons::default());
    rig.bridge.ingress().handle_datagram(datagram.as_bytes());
    run_until(&mut executor, &clock, || rig.mouse_line.written().len() == 4);
    assert_eq!(rig.mouse_line.written(), [0x08, 0x00, 0x00, 0x0E]);
}

#[test]
fn test_malformed_datagram_forwards_nothing_after_error() {
    let rig = rig(BridgeConfig::default());
    let clock = ManualClock::stepping(100);
    let mut executor = rig
        .bridge
        .keyboard_executor(clock.clone(), RecordingIndicator::new());

    let stats = rig
        .bridge
        .ingress()
        .handle_datagram(&[b'K', 1, 0x29, b'K', 9, 0x1C]);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 1);

    run_until(&mut executor, &clock, || rig.bridge.keyboard().queue().is_empty());
    assert_eq!(rig.keyboard_line.written(), [0x29]);
}
