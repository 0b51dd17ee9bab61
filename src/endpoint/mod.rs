//! Named text endpoints fronting the controller state.
//!
//! Reads format a fresh snapshot on every call. Writes take the whole
//! payload at once; a non-zero offset is always rejected before the payload
//! is looked at.

mod message;
pub mod text;

use std::sync::Arc;

use crate::error::ControlError;
use crate::mode::{ModeSequencer, PeripheralMode};
use crate::pattern::{Pattern, PatternEngine, Tempo};

pub use message::MessageEndpoint;

/// Input buffer for pattern and message writes.
pub const PATTERN_BUFFER_CAPACITY: usize = 512;
/// Input buffer for single-integer writes.
pub const INT_BUFFER_CAPACITY: usize = 64;

pub const LED_PATTERN: &str = "led_pattern";
pub const LED_TEMPO: &str = "led_tempo";
pub const PERIPHERAL_MODE: &str = "peripheral_mode";
pub const MESSAGE: &str = "message";

/// Historical name of `peripheral_mode`.
pub const PERIPHERAL_MODE_ALIAS: &str = "lcm_tempo";

/// A readable and writable piece of controller state.
pub trait Endpoint: Send + Sync {
    fn name(&self) -> &'static str;

    fn read(&self) -> String;

    fn write(&self, offset: u64, payload: &[u8]) -> Result<(), ControlError>;
}

/// Validate offset and size, then decode the payload as text.
fn accept_payload(offset: u64, payload: &[u8], capacity: usize) -> Result<String, ControlError> {
    if offset != 0 {
        return Err(ControlError::InvalidOffset { offset });
    }
    if payload.len() > capacity {
        return Err(ControlError::BufferTooLarge {
            len: payload.len(),
            capacity,
        });
    }
    Ok(String::from_utf8_lossy(payload).into_owned())
}

pub struct PatternEndpoint {
    engine: Arc<PatternEngine>,
}

impl PatternEndpoint {
    pub fn new(engine: Arc<PatternEngine>) -> Self {
        Self { engine }
    }
}

impl Endpoint for PatternEndpoint {
    fn name(&self) -> &'static str {
        LED_PATTERN
    }

    fn read(&self) -> String {
        self.engine.read_pattern()
    }

    fn write(&self, offset: u64, payload: &[u8]) -> Result<(), ControlError> {
        let text = accept_payload(offset, payload, PATTERN_BUFFER_CAPACITY)?;
        tracing::debug!(input = %text.trim_end(), "Received LED pattern");
        let pattern = Pattern::parse(&text)?;
        tracing::debug!(parsed = pattern.len(), "Parsed LED pattern");
        self.engine.replace_pattern(pattern);
        Ok(())
    }
}

pub struct TempoEndpoint {
    engine: Arc<PatternEngine>,
}

impl TempoEndpoint {
    pub fn new(engine: Arc<PatternEngine>) -> Self {
        Self { engine }
    }
}

impl Endpoint for TempoEndpoint {
    fn name(&self) -> &'static str {
        LED_TEMPO
    }

    fn read(&self) -> String {
        self.engine.read_tempo()
    }

    fn write(&self, offset: u64, payload: &[u8]) -> Result<(), ControlError> {
        let text = accept_payload(offset, payload, INT_BUFFER_CAPACITY)?;
        let tempo = Tempo::new(text::parse_int(&text)?)?;
        self.engine.set_tempo(tempo);
        Ok(())
    }
}

pub struct ModeEndpoint {
    sequencer: Arc<ModeSequencer>,
}

impl ModeEndpoint {
    pub fn new(sequencer: Arc<ModeSequencer>) -> Self {
        Self { sequencer }
    }
}

impl Endpoint for ModeEndpoint {
    fn name(&self) -> &'static str {
        PERIPHERAL_MODE
    }

    fn read(&self) -> String {
        self.sequencer.read_mode()
    }

    fn write(&self, offset: u64, payload: &[u8]) -> Result<(), ControlError> {
        let text = accept_payload(offset, payload, INT_BUFFER_CAPACITY)?;
        let mode = PeripheralMode::from_value(text::parse_int(&text)?)?;
        self.sequencer.set_mode(mode)
    }
}

/// Fixed set of endpoints, built once at startup.
pub struct EndpointTable {
    endpoints: Vec<Arc<dyn Endpoint>>,
}

impl EndpointTable {
    pub fn new(endpoints: Vec<Arc<dyn Endpoint>>) -> Self {
        Self { endpoints }
    }

    /// Standard endpoints, plus the message echo endpoint when requested.
    pub fn standard(
        engine: &Arc<PatternEngine>,
        sequencer: &Arc<ModeSequencer>,
        with_message: bool,
    ) -> Self {
        let mut endpoints: Vec<Arc<dyn Endpoint>> = vec![
            Arc::new(PatternEndpoint::new(Arc::clone(engine))),
            Arc::new(TempoEndpoint::new(Arc::clone(engine))),
            Arc::new(ModeEndpoint::new(Arc::clone(sequencer))),
        ];
        if with_message {
            endpoints.push(Arc::new(MessageEndpoint::new()));
        }
        Self::new(endpoints)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.endpoints.iter().map(|endpoint| endpoint.name()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn Endpoint>, ControlError> {
        let name = if name == PERIPHERAL_MODE_ALIAS {
            PERIPHERAL_MODE
        } else {
            name
        };
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.name() == name)
            .ok_or_else(|| ControlError::UnknownEndpoint {
                name: name.to_string(),
            })
    }

    pub fn read(&self, name: &str) -> Result<String, ControlError> {
        Ok(self.get(name)?.read())
    }

    pub fn write(&self, name: &str, offset: u64, payload: &[u8]) -> Result<(), ControlError> {
        let endpoint = self.get(name)?;
        let result = endpoint.write(offset, payload);
        if let Err(err) = &result {
            tracing::info!(endpoint = endpoint.name(), kind = err.kind(), error = %err, "Rejected write");
        }
        result
    }
}
