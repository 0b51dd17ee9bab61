//! Controller lifecycle: acquire lines, build the engines and endpoints,
//! start ticking, and tear everything down in reverse.

use std::sync::Arc;

use scopeguard::ScopeGuard;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::endpoint::EndpointTable;
use crate::error::StartupError;
use crate::mode::{ModePins, ModeSequencer, PeripheralMode};
use crate::pattern::{LedPins, PatternEngine, PatternSnapshot};
use crate::pin::{OutputPin, PinChip};
use crate::scheduler::TickScheduler;

/// Combined view returned by the `STATUS` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub pattern: PatternSnapshot,
    pub mode: PeripheralMode,
}

/// Shared, non-owning access to a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    engine: Arc<PatternEngine>,
    sequencer: Arc<ModeSequencer>,
    endpoints: Arc<EndpointTable>,
}

impl ControllerHandle {
    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    pub fn engine(&self) -> &PatternEngine {
        &self.engine
    }

    pub fn sequencer(&self) -> &ModeSequencer {
        &self.sequencer
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            pattern: self.engine.snapshot(),
            mode: self.sequencer.mode(),
        }
    }
}

pub struct Controller {
    handle: ControllerHandle,
    scheduler: TickScheduler,
}

fn release_on_unwind(mut pin: Box<dyn OutputPin>) {
    tracing::warn!(line = pin.line(), label = pin.label(), "Releasing line after failed startup");
    if let Err(err) = pin.release() {
        tracing::warn!(line = pin.line(), error = %err, "Failed to release line");
    }
}

impl Controller {
    /// Acquire all four lines and start the tick scheduler.
    ///
    /// Must be called from within a tokio runtime. If any line cannot be
    /// acquired, the ones already held are released before returning.
    pub fn start(config: &Config, chip: &dyn PinChip) -> Result<Self, StartupError> {
        config.validate()?;
        let pattern = config.pattern()?;
        let tempo = config.tempo()?;
        let mode = config.mode()?;
        let levels = mode.levels();
        let lines = &config.pins;

        // Guards drop in reverse order, so a failure unwinds newest-first.
        let blue = scopeguard::guard(chip.request(lines.led_blue, "logo-blue", true)?, release_on_unwind);
        let white = scopeguard::guard(chip.request(lines.led_white, "logo-white", true)?, release_on_unwind);
        let reset = scopeguard::guard(
            chip.request(lines.lcm_reset, "lcm-reset", levels.reset)?,
            release_on_unwind,
        );
        let boot = scopeguard::guard(
            chip.request(lines.lcm_boot, "lcm-boot", levels.boot)?,
            release_on_unwind,
        );

        let engine = Arc::new(PatternEngine::new(
            pattern,
            tempo,
            LedPins {
                blue: ScopeGuard::into_inner(blue),
                white: ScopeGuard::into_inner(white),
            },
        ));
        let sequencer = Arc::new(ModeSequencer::new(
            mode,
            ModePins {
                boot: ScopeGuard::into_inner(boot),
                reset: ScopeGuard::into_inner(reset),
            },
        ));
        let endpoints = Arc::new(EndpointTable::standard(
            &engine,
            &sequencer,
            config.control.echo_endpoint,
        ));

        let scheduler = TickScheduler::spawn(Arc::clone(&engine));

        tracing::info!(
            tempo = tempo.bpm(),
            pattern_len = config.pattern.codes.len(),
            mode = mode.value(),
            endpoints = ?endpoints.names(),
            "Controller started"
        );

        Ok(Self {
            handle: ControllerHandle {
                engine,
                sequencer,
                endpoints,
            },
            scheduler,
        })
    }

    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    /// Stop ticking, then release every line.
    pub async fn shutdown(self) {
        self.scheduler.stop().await;
        self.handle.engine.release_pins();
        self.handle.sequencer.release_pins();
        tracing::info!("Controller stopped, output lines released");
    }
}
