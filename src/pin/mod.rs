//! Binary output lines.
//!
//! The controller never touches GPIO directly: it asks a [`PinChip`] for
//! lines and drives them through [`OutputPin`]. Two chips are provided, one
//! backed by the legacy `/sys/class/gpio` interface and one that keeps line
//! levels in memory.

mod memory;
mod sysfs;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{PinBackend, PinsConfig};

pub use memory::{MemoryChip, PinWrite};
pub use sysfs::SysfsChip;

/// Errors raised while requesting, driving or releasing a line.
#[derive(Debug, Error)]
pub enum PinError {
    #[error("line {line} ({label}) unavailable: {reason}")]
    Unavailable {
        line: u32,
        label: String,
        reason: String,
    },

    #[error("I/O on line {line} ({label}) failed: {source}")]
    Io {
        line: u32,
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line} ({label}) was already released")]
    Released { line: u32, label: String },
}

/// A requested output line.
pub trait OutputPin: Send {
    fn line(&self) -> u32;

    fn label(&self) -> &str;

    /// Drive the line high (`true`) or low (`false`).
    fn set(&mut self, high: bool) -> Result<(), PinError>;

    /// Give the line back to the chip. Further `set` calls fail.
    fn release(&mut self) -> Result<(), PinError>;
}

/// Source of output lines.
pub trait PinChip: Send + Sync {
    /// Claim `line` as an output, initially driven to `initial`.
    fn request(
        &self,
        line: u32,
        label: &str,
        initial: bool,
    ) -> Result<Box<dyn OutputPin>, PinError>;
}

/// Build the chip selected by configuration.
pub fn open_chip(config: &PinsConfig) -> Arc<dyn PinChip> {
    match config.backend {
        PinBackend::Sysfs => Arc::new(SysfsChip::new(config.sysfs_root.clone())),
        PinBackend::Memory => Arc::new(MemoryChip::new()),
    }
}

/// Release every pin, logging failures. Used on shutdown and startup unwind.
pub(crate) fn release_all(pins: &mut [Box<dyn OutputPin>]) {
    for pin in pins.iter_mut() {
        if let Err(err) = pin.release() {
            tracing::warn!(line = pin.line(), label = pin.label(), error = %err, "Failed to release line");
        }
    }
}
