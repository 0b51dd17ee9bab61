//! Endpoint read/write semantics as seen by an operator.

mod common;

use boardctl::endpoint::{EndpointTable, LED_PATTERN, LED_TEMPO, PERIPHERAL_MODE};
use boardctl::error::ControlError;
use boardctl::mode::PeripheralMode;
use boardctl::pin::MemoryChip;
use common::*;

struct Fixture {
    table: EndpointTable,
    led_chip: MemoryChip,
    mode_chip: MemoryChip,
}

fn fixture() -> Fixture {
    let (engine, led_chip) = engine_with(&[0], 120);
    let (sequencer, mode_chip) = sequencer_with(PeripheralMode::Run);
    Fixture {
        table: EndpointTable::standard(&engine, &sequencer, false),
        led_chip,
        mode_chip,
    }
}

#[test]
fn pattern_write_then_read_returns_parsed_values() {
    let fx = fixture();
    fx.table.write(LED_PATTERN, 0, b"5 7 x 3").unwrap();
    assert_eq!(fx.table.read(LED_PATTERN).unwrap(), "type0: 5\ntype1: 7\n\n");
}

#[test]
fn pattern_token_with_trailing_garbage_keeps_its_prefix() {
    let fx = fixture();
    fx.table.write(LED_PATTERN, 0, b"5 7x 3").unwrap();
    assert_eq!(fx.table.read(LED_PATTERN).unwrap(), "type0: 5\ntype1: 7\n\n");

    fx.table.write(LED_PATTERN, 0, b"1,2,3\n").unwrap();
    assert_eq!(fx.table.read(LED_PATTERN).unwrap(), "type0: 1\n\n");
}

#[test]
fn pattern_write_is_evaluated_immediately() {
    let fx = fixture();
    fx.table.write(LED_PATTERN, 0, b"2 1").unwrap();
    assert_eq!(led_levels(&fx.led_chip.writes()), vec![(false, true)]);
}

#[test]
fn pattern_without_valid_leading_value_is_rejected() {
    let fx = fixture();
    fx.table.write(LED_PATTERN, 0, b"1 2").unwrap();
    let err = fx.table.write(LED_PATTERN, 0, b"x 9").unwrap_err();
    assert!(matches!(err, ControlError::ParseFailure { .. }));
    assert_eq!(fx.table.read(LED_PATTERN).unwrap(), "type0: 1\ntype1: 2\n\n");
}

#[test]
fn oversized_pattern_payload_is_rejected() {
    let fx = fixture();
    let payload = "1 ".repeat(257);
    assert_eq!(payload.len(), 514);
    assert_eq!(
        fx.table.write(LED_PATTERN, 0, payload.as_bytes()),
        Err(ControlError::BufferTooLarge {
            len: 514,
            capacity: 512
        })
    );
}

#[test]
fn pattern_beyond_capacity_is_truncated() {
    let fx = fixture();
    let payload = "1 ".repeat(200);
    fx.table.write(LED_PATTERN, 0, payload.as_bytes()).unwrap();
    let text = fx.table.read(LED_PATTERN).unwrap();
    assert_eq!(text.lines().filter(|l| !l.is_empty()).count(), 128);
    assert!(text.contains("type127: 1\n"));
    assert!(!text.contains("type128"));
}

#[test]
fn tempo_bounds() {
    let fx = fixture();
    assert!(matches!(
        fx.table.write(LED_TEMPO, 0, b"0"),
        Err(ControlError::OutOfRange { value: 0, .. })
    ));
    assert!(matches!(
        fx.table.write(LED_TEMPO, 0, b"255"),
        Err(ControlError::OutOfRange { value: 255, .. })
    ));
    assert_eq!(fx.table.read(LED_TEMPO).unwrap(), "120 (beats per minute)\n");

    fx.table.write(LED_TEMPO, 0, b"254").unwrap();
    assert_eq!(fx.table.read(LED_TEMPO).unwrap(), "254 (beats per minute)\n");
}

#[test]
fn tempo_accepts_kernel_integer_syntax() {
    let fx = fixture();
    fx.table.write(LED_TEMPO, 0, b"0x40\n").unwrap();
    assert_eq!(fx.table.read(LED_TEMPO).unwrap(), "64 (beats per minute)\n");
    assert!(matches!(
        fx.table.write(LED_TEMPO, 0, b"12 13"),
        Err(ControlError::ParseFailure { .. })
    ));
}

#[test]
fn mode_writes_assert_mapped_lines() {
    let fx = fixture();
    let expected = [(b"0", true, true), (b"1", true, false), (b"2", false, false)];
    for (payload, boot, reset) in expected {
        fx.table.write(PERIPHERAL_MODE, 0, payload).unwrap();
        assert_eq!(fx.mode_chip.level(LCM_BOOT), Some(boot));
        assert_eq!(fx.mode_chip.level(LCM_RESET), Some(reset));
    }
}

#[test]
fn invalid_mode_leaves_state_and_lines_untouched() {
    let fx = fixture();
    fx.table.write(PERIPHERAL_MODE, 0, b"1").unwrap();
    let writes = fx.mode_chip.writes();

    assert!(matches!(
        fx.table.write(PERIPHERAL_MODE, 0, b"3"),
        Err(ControlError::OutOfRange { value: 3, .. })
    ));
    assert_eq!(fx.mode_chip.writes(), writes);
    assert_eq!(
        fx.table.read(PERIPHERAL_MODE).unwrap(),
        "0x1 (BIT0: BOOT, BIT1: SWNRST)\n"
    );
}

#[test]
fn non_zero_offset_is_always_rejected() {
    let fx = fixture();
    let payloads: [&[u8]; 3] = [b"1", b"garbage", b""];
    for name in [LED_PATTERN, LED_TEMPO, PERIPHERAL_MODE] {
        for payload in payloads {
            assert_eq!(
                fx.table.write(name, 1, payload),
                Err(ControlError::InvalidOffset { offset: 1 }),
                "{name}"
            );
        }
    }
    assert!(fx.mode_chip.writes().is_empty());
    assert!(fx.led_chip.writes().is_empty());
}

#[test]
fn rewriting_read_back_state_changes_nothing() {
    let fx = fixture();
    fx.table.write(LED_PATTERN, 0, b"3 1 2").unwrap();
    fx.table.write(LED_TEMPO, 0, b"90").unwrap();
    fx.table.write(PERIPHERAL_MODE, 0, b"1").unwrap();
    let led_writes = fx.led_chip.writes().len();

    let pattern_text = fx.table.read(LED_PATTERN).unwrap();
    let values: Vec<&str> = pattern_text
        .lines()
        .filter_map(|line| line.split_once(": ").map(|(_, v)| v))
        .collect();
    fx.table.write(LED_PATTERN, 0, values.join(" ").as_bytes()).unwrap();
    fx.table.write(LED_TEMPO, 0, b"90").unwrap();
    fx.table.write(PERIPHERAL_MODE, 0, b"1").unwrap();

    assert_eq!(fx.table.read(LED_PATTERN).unwrap(), pattern_text);
    assert_eq!(fx.table.read(LED_TEMPO).unwrap(), "90 (beats per minute)\n");
    assert_eq!(fx.led_chip.writes().len(), led_writes);
}

#[test]
fn alias_and_unknown_names() {
    let fx = fixture();
    assert_eq!(
        fx.table.read("lcm_tempo").unwrap(),
        fx.table.read(PERIPHERAL_MODE).unwrap()
    );
    assert!(matches!(
        fx.table.read("led_pattern_x"),
        Err(ControlError::UnknownEndpoint { .. })
    ));
    assert_eq!(fx.table.names(), vec![LED_PATTERN, LED_TEMPO, PERIPHERAL_MODE]);
}
