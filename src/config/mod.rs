//! Startup configuration.
//!
//! Values come from a TOML file, then command-line overrides. They seed the
//! controller once; afterwards only the control endpoints change state.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{
    Config, ControlConfig, Overrides, PatternConfig, PeripheralConfig, PinBackend, PinsConfig,
};
