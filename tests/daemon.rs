//! End-to-end daemon runs over a real control socket.

mod common;

use boardctl::daemon;
use boardctl::error::StartupError;
use boardctl::ipc::{ControlClient, ControlServer};
use boardctl::shutdown::ShutdownManager;
use common::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn wait_for_socket(client: &ControlClient) {
    for _ in 0..100 {
        if client.list().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("daemon never published {}", client.path().display());
}

#[tokio::test]
async fn daemon_serves_until_shutdown_then_cleans_up() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("boardctl.sock");
    let mut config = memory_config();
    config.control.socket_path = socket.clone();
    config.control.echo_endpoint = true;

    let shutdown = Arc::new(ShutdownManager::new());
    let task = tokio::spawn(daemon::run(config, Arc::clone(&shutdown)));

    let client = ControlClient::new(&socket);
    wait_for_socket(&client).await;

    assert_eq!(
        client.list().await.unwrap(),
        vec!["led_pattern", "led_tempo", "peripheral_mode", "message"]
    );
    client.write("message", 0, b"hello").await.unwrap();
    assert_eq!(client.read("message").await.unwrap(), "hello");
    client.write("led_pattern", 0, b"1 0").await.unwrap();
    assert_eq!(client.status().await.unwrap().pattern.codes, vec![1, 0]);

    shutdown.signal_shutdown();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("daemon exits")
        .expect("join")
        .expect("clean run");

    assert!(!socket.exists());
    assert!(client.list().await.is_err());
}

#[tokio::test]
async fn daemon_refuses_socket_held_by_another_controller() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("boardctl.sock");
    let holder = ControlServer::bind(&socket).unwrap();

    let mut config = memory_config();
    config.control.socket_path = socket.clone();
    let result = daemon::run(config, Arc::new(ShutdownManager::new())).await;
    assert!(matches!(result, Err(StartupError::Locked { .. })));

    holder.unpublish();
}

#[tokio::test]
async fn invalid_config_is_rejected_before_publishing() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("boardctl.sock");
    let mut config = memory_config();
    config.control.socket_path = socket.clone();
    config.peripheral.mode = 7;

    let result = daemon::run(config, Arc::new(ShutdownManager::new())).await;
    assert!(matches!(result, Err(StartupError::Config(_))));
    assert!(!socket.exists());
}
