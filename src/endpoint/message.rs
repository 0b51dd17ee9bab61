use parking_lot::Mutex;

use super::{accept_payload, Endpoint, MESSAGE, PATTERN_BUFFER_CAPACITY};
use crate::error::ControlError;

/// Echoes back the last payload written to it.
#[derive(Default)]
pub struct MessageEndpoint {
    message: Mutex<String>,
}

impl MessageEndpoint {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Endpoint for MessageEndpoint {
    fn name(&self) -> &'static str {
        MESSAGE
    }

    fn read(&self) -> String {
        self.message.lock().clone()
    }

    fn write(&self, offset: u64, payload: &[u8]) -> Result<(), ControlError> {
        let text = accept_payload(offset, payload, PATTERN_BUFFER_CAPACITY)?;
        *self.message.lock() = text;
        Ok(())
    }
}
