//! LED pattern engine.
//!
//! A pattern is a bounded list of codes. Each tick drives the blue LED from
//! bit 0 and the white LED from bit 1 of the current code, then advances.

mod engine;

use std::fmt;
use std::time::Duration;

use crate::error::ControlError;

pub use engine::{LedPins, PatternEngine, PatternSnapshot, TickOutcome};

/// Maximum number of codes a pattern can hold.
pub const PATTERN_CAPACITY: usize = 128;

pub const MIN_TEMPO: u32 = 1;
pub const MAX_TEMPO: u32 = 254;
pub const DEFAULT_TEMPO: u32 = 120;

/// Tick interval numerator: one tick every `6000 / tempo` milliseconds.
const TEMPO_SCALE_MS: u64 = 6000;

/// A non-empty list of at most [`PATTERN_CAPACITY`] codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    codes: Vec<u32>,
}

impl Pattern {
    /// Returns `None` for an empty list or one longer than the capacity.
    pub fn new(codes: Vec<u32>) -> Option<Self> {
        if codes.is_empty() || codes.len() > PATTERN_CAPACITY {
            return None;
        }
        Some(Self { codes })
    }

    /// Parse whitespace-separated decimal codes.
    ///
    /// Each token contributes its leading run of digits. A token with
    /// trailing garbage keeps that prefix and ends the parse, a token with
    /// no leading digit ends it without contributing. Parsing also stops
    /// once the capacity is reached. Fails only when nothing was read.
    pub fn parse(input: &str) -> Result<Self, ControlError> {
        let mut codes = Vec::new();
        for token in input.split_ascii_whitespace() {
            let rest = token.trim_start_matches(|c: char| c.is_ascii_digit());
            let Ok(code) = token[..token.len() - rest.len()].parse::<u32>() else {
                break;
            };
            codes.push(code);
            if !rest.is_empty() || codes.len() == PATTERN_CAPACITY {
                break;
            }
        }

        Self::new(codes).ok_or_else(|| ControlError::ParseFailure {
            input: input.trim_end().to_string(),
        })
    }

    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Never true for a constructed pattern.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self { codes: vec![0] }
    }
}

/// Pattern advance rate, always within [`MIN_TEMPO`, `MAX_TEMPO`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo(u32);

impl Tempo {
    pub fn new(value: i64) -> Result<Self, ControlError> {
        match u32::try_from(value) {
            Ok(bpm) if (MIN_TEMPO..=MAX_TEMPO).contains(&bpm) => Ok(Self(bpm)),
            _ => Err(ControlError::OutOfRange {
                value,
                expected: "1..=254",
            }),
        }
    }

    pub fn bpm(self) -> u32 {
        self.0
    }

    pub fn interval(self) -> Duration {
        Duration::from_millis(TEMPO_SCALE_MS / u64::from(self.0))
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(DEFAULT_TEMPO)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (beats per minute)", self.0)
    }
}
