//! Peripheral boot/reset sequencing.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;
use crate::pin::{self, OutputPin};

/// Peripheral boot/reset configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PeripheralMode {
    /// Bootloader held: boot=1, reset=1.
    Boot = 0,
    /// In reset: boot=1, reset=0.
    Reset = 1,
    /// Normal run: boot=0, reset=0.
    #[default]
    Run = 2,
}

/// Levels for the boot and reset lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLevels {
    pub boot: bool,
    pub reset: bool,
}

impl PeripheralMode {
    pub fn from_value(value: i64) -> Result<Self, ControlError> {
        match value {
            0 => Ok(PeripheralMode::Boot),
            1 => Ok(PeripheralMode::Reset),
            2 => Ok(PeripheralMode::Run),
            _ => Err(ControlError::OutOfRange {
                value,
                expected: "0, 1 or 2",
            }),
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn levels(self) -> LineLevels {
        match self {
            PeripheralMode::Boot => LineLevels {
                boot: true,
                reset: true,
            },
            PeripheralMode::Reset => LineLevels {
                boot: true,
                reset: false,
            },
            PeripheralMode::Run => LineLevels {
                boot: false,
                reset: false,
            },
        }
    }
}

impl fmt::Display for PeripheralMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X} (BIT0: BOOT, BIT1: SWNRST)", self.value())
    }
}

pub struct ModePins {
    pub boot: Box<dyn OutputPin>,
    pub reset: Box<dyn OutputPin>,
}

struct SequencerState {
    mode: PeripheralMode,
    pins: Option<ModePins>,
}

/// Holds the current mode and re-asserts both lines on every change.
pub struct ModeSequencer {
    state: Mutex<SequencerState>,
}

impl ModeSequencer {
    pub fn new(mode: PeripheralMode, pins: ModePins) -> Self {
        Self {
            state: Mutex::new(SequencerState {
                mode,
                pins: Some(pins),
            }),
        }
    }

    pub fn mode(&self) -> PeripheralMode {
        self.state.lock().mode
    }

    /// Assert the lines for `mode`, then record it.
    ///
    /// The stored mode only changes once both lines were driven. If reset
    /// cannot be driven, boot is put back to the current mode's level.
    pub fn set_mode(&self, mode: PeripheralMode) -> Result<(), ControlError> {
        let mut state = self.state.lock();
        let previous = state.mode.levels();
        let Some(pins) = state.pins.as_mut() else {
            return Err(ControlError::ResourceUnavailable(
                "peripheral lines released".to_string(),
            ));
        };

        let levels = mode.levels();
        pins.boot.set(levels.boot)?;
        if let Err(err) = pins.reset.set(levels.reset) {
            if let Err(restore) = pins.boot.set(previous.boot) {
                tracing::warn!(line = pins.boot.line(), error = %restore, "Failed to restore boot line");
            }
            return Err(err.into());
        }

        if state.mode != mode {
            tracing::info!(old = state.mode.value(), new = mode.value(), "Peripheral mode changed");
        }
        state.mode = mode;
        Ok(())
    }

    pub fn read_mode(&self) -> String {
        format!("{}\n", self.mode())
    }

    /// Release boot and reset. Returns false if already released.
    pub fn release_pins(&self) -> bool {
        let Some(pins) = self.state.lock().pins.take() else {
            return false;
        };
        let mut pins = [pins.boot, pins.reset];
        pin::release_all(&mut pins);
        true
    }
}
