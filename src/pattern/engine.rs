use std::fmt::Write as _;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use super::{Pattern, Tempo};
use crate::pin::{self, OutputPin};

/// The two LED lines driven by the low bits of each code.
pub struct LedPins {
    pub blue: Box<dyn OutputPin>,
    pub white: Box<dyn OutputPin>,
}

impl LedPins {
    /// Returns true only if both lines took their new level.
    fn drive(&mut self, code: u32) -> bool {
        let writes = [(&mut self.blue, code & 0b01 != 0), (&mut self.white, code & 0b10 != 0)];
        let mut driven = true;
        for (pin, high) in writes {
            if let Err(err) = pin.set(high) {
                tracing::warn!(line = pin.line(), error = %err, "Failed to drive LED");
                driven = false;
            }
        }
        driven
    }

    fn release(self) {
        let mut pins = [self.blue, self.white];
        pin::release_all(&mut pins);
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Code read at the start of the tick.
    pub code: u32,
    /// Whether the LEDs were driven (the code differed from the last output).
    /// A failed write leaves `last_output` alone so the next tick retries.
    pub wrote: bool,
    /// Index the next tick will read.
    pub next_index: usize,
}

/// Point-in-time copy of the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub codes: Vec<u32>,
    pub index: usize,
    pub tempo: u32,
    pub last_output: Option<u32>,
}

struct EngineState {
    pattern: Pattern,
    index: usize,
    tempo: Tempo,
    last_output: Option<u32>,
    pins: Option<LedPins>,
}

impl EngineState {
    fn step(&mut self) -> Option<TickOutcome> {
        let pins = self.pins.as_mut()?;
        let code = self.pattern.codes()[self.index];

        let wrote = self.last_output != Some(code);
        if wrote && pins.drive(code) {
            self.last_output = Some(code);
        }

        let len = self.pattern.len();
        if len > 1 {
            self.index = (self.index + 1) % len;
        }

        Some(TickOutcome {
            code,
            wrote,
            next_index: self.index,
        })
    }
}

/// Pattern state plus the LED lines, guarded as one unit.
///
/// Every mutation (tick, pattern replacement, tempo change) takes the same
/// lock, so a tick never observes an index past a freshly shortened pattern.
pub struct PatternEngine {
    state: Mutex<EngineState>,
    rearm: Notify,
}

impl PatternEngine {
    pub fn new(pattern: Pattern, tempo: Tempo, pins: LedPins) -> Self {
        Self {
            state: Mutex::new(EngineState {
                pattern,
                index: 0,
                tempo,
                last_output: None,
                pins: Some(pins),
            }),
            rearm: Notify::new(),
        }
    }

    /// Advance by one step.
    ///
    /// Returns `None` once the LED lines have been released.
    pub fn tick(&self) -> Option<TickOutcome> {
        let outcome = self.state.lock().step();
        if let Some(outcome) = outcome {
            tracing::trace!(code = outcome.code, wrote = outcome.wrote, next = outcome.next_index, "tick");
        }
        outcome
    }

    /// Swap in a new pattern, restart it from the first code and evaluate it
    /// immediately.
    pub fn replace_pattern(&self, pattern: Pattern) -> Option<TickOutcome> {
        let mut state = self.state.lock();
        tracing::info!(len = pattern.len(), "LED pattern replaced");
        state.pattern = pattern;
        state.index = 0;
        state.step()
    }

    /// Returns true if the tempo changed, in which case the scheduler is
    /// re-armed with the new interval.
    pub fn set_tempo(&self, tempo: Tempo) -> bool {
        let mut state = self.state.lock();
        if state.tempo == tempo {
            return false;
        }
        tracing::info!(old = state.tempo.bpm(), new = tempo.bpm(), "LED tempo changed");
        state.tempo = tempo;
        drop(state);

        self.rearm.notify_one();
        true
    }

    pub fn tempo(&self) -> Tempo {
        self.state.lock().tempo
    }

    pub fn interval(&self) -> Duration {
        self.tempo().interval()
    }

    pub fn snapshot(&self) -> PatternSnapshot {
        let state = self.state.lock();
        PatternSnapshot {
            codes: state.pattern.codes().to_vec(),
            index: state.index,
            tempo: state.tempo.bpm(),
            last_output: state.last_output,
        }
    }

    /// `type<i>: <code>` per entry followed by a blank line.
    pub fn read_pattern(&self) -> String {
        let codes = self.snapshot().codes;
        let mut out = String::with_capacity(codes.len() * 12 + 1);
        for (i, code) in codes.iter().enumerate() {
            let _ = writeln!(out, "type{}: {}", i, code);
        }
        out.push('\n');
        out
    }

    pub fn read_tempo(&self) -> String {
        format!("{}\n", self.tempo())
    }

    /// Release both LED lines. Later ticks do nothing.
    ///
    /// Returns false if they were already released.
    pub fn release_pins(&self) -> bool {
        let pins = self.state.lock().pins.take();
        match pins {
            Some(pins) => {
                pins.release();
                true
            }
            None => false,
        }
    }

    /// Resolves once after each effective tempo change.
    pub(crate) async fn rearmed(&self) {
        self.rearm.notified().await
    }
}
