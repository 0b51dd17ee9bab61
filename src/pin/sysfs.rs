//! Output lines through the legacy `/sys/class/gpio` interface.
//!
//! All I/O here is blocking and runs on whichever tokio worker calls in,
//! with the engine or sequencer lock held. Attribute writes complete in
//! microseconds; only `request` may sleep while udev settles, and that
//! happens once per line at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::{OutputPin, PinChip, PinError};

/// How long to wait for udev to create `gpioN/` after an export.
const EXPORT_SETTLE: Duration = Duration::from_millis(10);
const EXPORT_ATTEMPTS: u32 = 10;

pub struct SysfsChip {
    root: PathBuf,
}

impl SysfsChip {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{}", line))
    }

    fn export(&self, line: u32, label: &str) -> Result<PathBuf, PinError> {
        let dir = self.line_dir(line);
        if dir.exists() {
            return Ok(dir);
        }

        fs::write(self.root.join("export"), line.to_string()).map_err(|source| {
            PinError::Io {
                line,
                label: label.to_string(),
                source,
            }
        })?;

        for _ in 0..EXPORT_ATTEMPTS {
            if dir.exists() {
                return Ok(dir);
            }
            thread::sleep(EXPORT_SETTLE);
        }

        Err(PinError::Unavailable {
            line,
            label: label.to_string(),
            reason: format!("{} did not appear after export", dir.display()),
        })
    }
}

impl PinChip for SysfsChip {
    fn request(
        &self,
        line: u32,
        label: &str,
        initial: bool,
    ) -> Result<Box<dyn OutputPin>, PinError> {
        let dir = self.export(line, label)?;

        // "high"/"low" switch to output and set the level in one step.
        let direction = if initial { "high" } else { "low" };
        fs::write(dir.join("direction"), direction).map_err(|source| PinError::Io {
            line,
            label: label.to_string(),
            source,
        })?;

        tracing::debug!(line, label, direction, "Requested sysfs line");

        Ok(Box::new(SysfsPin {
            line,
            label: label.to_string(),
            value_path: dir.join("value"),
            unexport_path: self.root.join("unexport"),
            released: false,
        }))
    }
}

struct SysfsPin {
    line: u32,
    label: String,
    value_path: PathBuf,
    unexport_path: PathBuf,
    released: bool,
}

impl SysfsPin {
    fn write_attr(&self, path: &Path, value: &str) -> Result<(), PinError> {
        if self.released {
            return Err(PinError::Released {
                line: self.line,
                label: self.label.clone(),
            });
        }
        fs::write(path, value).map_err(|source| PinError::Io {
            line: self.line,
            label: self.label.clone(),
            source,
        })
    }
}

impl OutputPin for SysfsPin {
    fn line(&self) -> u32 {
        self.line
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn set(&mut self, high: bool) -> Result<(), PinError> {
        self.write_attr(&self.value_path, if high { "1" } else { "0" })
    }

    fn release(&mut self) -> Result<(), PinError> {
        self.write_attr(&self.unexport_path, &self.line.to_string())?;
        self.released = true;
        Ok(())
    }
}
