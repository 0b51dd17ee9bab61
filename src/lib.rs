//! Status-LED pattern driver and peripheral boot/reset sequencer with a
//! line-oriented control socket.

pub mod config;
pub mod controller;
pub mod daemon;
pub mod endpoint;
pub mod error;
pub mod ipc;
pub mod logging;
pub mod mode;
pub mod pattern;
pub mod pin;
pub mod scheduler;
pub mod shutdown;
