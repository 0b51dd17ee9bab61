//! Daemon lifecycle.
//!
//! Startup order is: publish the control socket, acquire lines, start
//! ticking. Shutdown runs the reverse: stop ticking, release lines, remove
//! the socket.

use std::sync::Arc;

use crate::config::Config;
use crate::controller::Controller;
use crate::error::StartupError;
use crate::ipc::ControlServer;
use crate::pin;
use crate::shutdown::ShutdownManager;

/// Run until `shutdown` is signalled.
pub async fn run(config: Config, shutdown: Arc<ShutdownManager>) -> Result<(), StartupError> {
    config.validate()?;

    let server = ControlServer::bind(&config.control.socket_path)?;
    let chip = pin::open_chip(&config.pins);
    let controller = match Controller::start(&config, chip.as_ref()) {
        Ok(controller) => controller,
        Err(err) => {
            tracing::error!(error = %err, "Controller startup failed");
            server.unpublish();
            return Err(err);
        }
    };

    server.serve(controller.handle(), Arc::clone(&shutdown)).await;

    controller.shutdown().await;
    server.unpublish();
    Ok(())
}
