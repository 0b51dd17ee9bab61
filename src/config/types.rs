use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pattern::DEFAULT_TEMPO;

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default)]
    pub peripheral: PeripheralConfig,
    #[serde(default)]
    pub pins: PinsConfig,
    #[serde(default)]
    pub control: ControlConfig,
}

/// Initial LED pattern and tempo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Codes driving the LEDs (bit 0: blue, bit 1: white).
    #[serde(default = "default_codes")]
    pub codes: Vec<u32>,
    /// Ticks happen every `6000 / tempo` milliseconds (default: 120).
    #[serde(default = "default_tempo")]
    pub tempo: u32,
}

/// Initial peripheral mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeripheralConfig {
    /// 0 = boot, 1 = reset, 2 = run (default: 2).
    #[serde(default = "default_mode")]
    pub mode: u8,
}

/// Which GPIO implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinBackend {
    #[default]
    Sysfs,
    Memory,
}

/// Output line numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinsConfig {
    #[serde(default)]
    pub backend: PinBackend,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    #[serde(default = "default_led_blue")]
    pub led_blue: u32,
    #[serde(default = "default_led_white")]
    pub led_white: u32,
    #[serde(default = "default_lcm_reset")]
    pub lcm_reset: u32,
    #[serde(default = "default_lcm_boot")]
    pub lcm_boot: u32,
}

/// Control socket settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// Publish the `message` echo endpoint.
    #[serde(default)]
    pub echo_endpoint: bool,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub codes: Option<Vec<u32>>,
    pub tempo: Option<u32>,
    pub mode: Option<u8>,
    pub backend: Option<PinBackend>,
    pub socket_path: Option<PathBuf>,
}

impl Config {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(codes) = overrides.codes {
            self.pattern.codes = codes;
        }
        if let Some(tempo) = overrides.tempo {
            self.pattern.tempo = tempo;
        }
        if let Some(mode) = overrides.mode {
            self.peripheral.mode = mode;
        }
        if let Some(backend) = overrides.backend {
            self.pins.backend = backend;
        }
        if let Some(socket_path) = overrides.socket_path {
            self.control.socket_path = socket_path;
        }
    }
}

fn default_codes() -> Vec<u32> {
    vec![0]
}

fn default_tempo() -> u32 {
    DEFAULT_TEMPO
}

fn default_mode() -> u8 {
    2
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_led_blue() -> u32 {
    29
}

fn default_led_white() -> u32 {
    28
}

fn default_lcm_reset() -> u32 {
    27
}

fn default_lcm_boot() -> u32 {
    26
}

fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("boardctl.sock")
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            codes: default_codes(),
            tempo: default_tempo(),
        }
    }
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
        }
    }
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            backend: PinBackend::default(),
            sysfs_root: default_sysfs_root(),
            led_blue: default_led_blue(),
            led_white: default_led_white(),
            lcm_reset: default_lcm_reset(),
            lcm_boot: default_lcm_boot(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            echo_endpoint: false,
        }
    }
}
