//! Shared test utilities.

#![allow(dead_code)]

use boardctl::config::{Config, PinBackend};
use boardctl::mode::{ModePins, ModeSequencer, PeripheralMode};
use boardctl::pattern::{LedPins, Pattern, PatternEngine, Tempo};
use boardctl::pin::{MemoryChip, PinChip, PinWrite};
use std::sync::Arc;

pub const LED_BLUE: u32 = 29;
pub const LED_WHITE: u32 = 28;
pub const LCM_RESET: u32 = 27;
pub const LCM_BOOT: u32 = 26;

/// Default config driving memory lines.
pub fn memory_config() -> Config {
    let mut config = Config::default();
    config.pins.backend = PinBackend::Memory;
    config
}

pub fn engine_with(codes: &[u32], tempo: u32) -> (Arc<PatternEngine>, MemoryChip) {
    let chip = MemoryChip::new();
    let pins = LedPins {
        blue: chip.request(LED_BLUE, "logo-blue", true).unwrap(),
        white: chip.request(LED_WHITE, "logo-white", true).unwrap(),
    };
    let engine = PatternEngine::new(
        Pattern::new(codes.to_vec()).expect("valid pattern"),
        Tempo::new(i64::from(tempo)).expect("valid tempo"),
        pins,
    );
    (Arc::new(engine), chip)
}

pub fn sequencer_with(mode: PeripheralMode) -> (Arc<ModeSequencer>, MemoryChip) {
    let chip = MemoryChip::new();
    let levels = mode.levels();
    let pins = ModePins {
        boot: chip.request(LCM_BOOT, "lcm-boot", levels.boot).unwrap(),
        reset: chip.request(LCM_RESET, "lcm-reset", levels.reset).unwrap(),
    };
    (Arc::new(ModeSequencer::new(mode, pins)), chip)
}

/// Pair LED writes up as (blue, white) levels.
pub fn led_levels(writes: &[PinWrite]) -> Vec<(bool, bool)> {
    writes
        .chunks(2)
        .map(|pair| {
            assert_eq!(pair[0].line, LED_BLUE);
            assert_eq!(pair[1].line, LED_WHITE);
            (pair[0].high, pair[1].high)
        })
        .collect()
}
