//! In-memory output lines.
//!
//! Every `set` is recorded so callers can inspect the exact write sequence.
//! Requests and writes for a given line can be made to fail to exercise
//! startup unwind and error paths.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{OutputPin, PinChip, PinError};

/// One recorded `set` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    pub line: u32,
    pub high: bool,
}

#[derive(Default)]
struct ChipState {
    levels: HashMap<u32, bool>,
    claimed: HashSet<u32>,
    failing: HashSet<u32>,
    failing_sets: HashSet<u32>,
    writes: Vec<PinWrite>,
}

/// Cloneable handle onto a shared set of memory lines.
#[derive(Clone, Default)]
pub struct MemoryChip {
    state: Arc<Mutex<ChipState>>,
}

impl MemoryChip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future requests for `line` fail.
    pub fn fail_requests_for(&self, line: u32) {
        self.state.lock().failing.insert(line);
    }

    /// Make `set` on `line` fail until [`allow_sets_for`](Self::allow_sets_for).
    pub fn fail_sets_for(&self, line: u32) {
        self.state.lock().failing_sets.insert(line);
    }

    pub fn allow_sets_for(&self, line: u32) {
        self.state.lock().failing_sets.remove(&line);
    }

    /// Current level of `line`, if it was ever requested.
    pub fn level(&self, line: u32) -> Option<bool> {
        self.state.lock().levels.get(&line).copied()
    }

    pub fn is_claimed(&self, line: u32) -> bool {
        self.state.lock().claimed.contains(&line)
    }

    /// All `set` calls so far, oldest first.
    pub fn writes(&self) -> Vec<PinWrite> {
        self.state.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }
}

impl PinChip for MemoryChip {
    fn request(
        &self,
        line: u32,
        label: &str,
        initial: bool,
    ) -> Result<Box<dyn OutputPin>, PinError> {
        let mut state = self.state.lock();
        if state.failing.contains(&line) {
            return Err(PinError::Unavailable {
                line,
                label: label.to_string(),
                reason: "request rejected".to_string(),
            });
        }
        if !state.claimed.insert(line) {
            return Err(PinError::Unavailable {
                line,
                label: label.to_string(),
                reason: "line busy".to_string(),
            });
        }
        state.levels.insert(line, initial);

        Ok(Box::new(MemoryPin {
            line,
            label: label.to_string(),
            released: false,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryPin {
    line: u32,
    label: String,
    released: bool,
    state: Arc<Mutex<ChipState>>,
}

impl MemoryPin {
    fn ensure_claimed(&self) -> Result<(), PinError> {
        if self.released {
            return Err(PinError::Released {
                line: self.line,
                label: self.label.clone(),
            });
        }
        Ok(())
    }
}

impl OutputPin for MemoryPin {
    fn line(&self) -> u32 {
        self.line
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn set(&mut self, high: bool) -> Result<(), PinError> {
        self.ensure_claimed()?;
        let mut state = self.state.lock();
        if state.failing_sets.contains(&self.line) {
            return Err(PinError::Io {
                line: self.line,
                label: self.label.clone(),
                source: std::io::Error::other("write rejected"),
            });
        }
        state.levels.insert(self.line, high);
        state.writes.push(PinWrite {
            line: self.line,
            high,
        });
        Ok(())
    }

    fn release(&mut self) -> Result<(), PinError> {
        self.ensure_claimed()?;
        self.released = true;
        self.state.lock().claimed.remove(&self.line);
        Ok(())
    }
}
