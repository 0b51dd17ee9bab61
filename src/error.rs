//! Error types shared by the control endpoints and controller startup.

use std::path::PathBuf;

use thiserror::Error;

use crate::pin::PinError;

/// Errors reported to the caller of an endpoint read or write.
///
/// A failed write never mutates controller state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Only whole-buffer writes at offset 0 are supported.
    #[error("write offset must be 0 (got {offset})")]
    InvalidOffset { offset: u64 },

    /// The raw payload does not fit the endpoint's input buffer.
    #[error("payload of {len} bytes exceeds the {capacity}-byte buffer")]
    BufferTooLarge { len: usize, capacity: usize },

    /// No valid leading value could be parsed.
    #[error("could not parse {input:?}")]
    ParseFailure { input: String },

    /// The parsed value is outside what the endpoint accepts.
    #[error("{value} is out of range (expected {expected})")]
    OutOfRange { value: i64, expected: &'static str },

    /// An output line could not be driven.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("unknown endpoint '{name}'")]
    UnknownEndpoint { name: String },
}

impl ControlError {
    /// Stable snake_case name used on the control socket.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlError::InvalidOffset { .. } => "invalid_offset",
            ControlError::BufferTooLarge { .. } => "buffer_too_large",
            ControlError::ParseFailure { .. } => "parse_failure",
            ControlError::OutOfRange { .. } => "out_of_range",
            ControlError::ResourceUnavailable(_) => "resource_unavailable",
            ControlError::UnknownEndpoint { .. } => "unknown_endpoint",
        }
    }
}

impl From<PinError> for ControlError {
    fn from(err: PinError) -> Self {
        ControlError::ResourceUnavailable(err.to_string())
    }
}

/// Fatal errors while bringing the controller up.
///
/// Anything acquired before the failure has already been released when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to acquire output line: {0}")]
    Pin(#[from] PinError),

    #[error("another controller holds '{path}': {source}")]
    Locked {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to publish control socket '{path}': {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid startup configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}
