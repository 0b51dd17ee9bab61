use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::controller::ControllerHandle;
use crate::error::{ControlError, StartupError};
use crate::shutdown::ShutdownManager;

use super::types::{ProtocolError, Request, Response, MAX_REQUEST_LINE};

const CONNECTION_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Publishes the endpoints on a Unix socket.
///
/// Binding takes an exclusive lock next to the socket so two controllers
/// never drive the same lines.
pub struct ControlServer {
    listener: UnixListener,
    path: PathBuf,
    lock: File,
}

impl ControlServer {
    /// Must be called from within a tokio runtime.
    pub fn bind(path: &Path) -> Result<Self, StartupError> {
        let publish_err = |source| StartupError::Publish {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(publish_err)?;
        }

        let lock_path = path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(publish_err)?;
        FileExt::try_lock_exclusive(&lock)
            .map_err(|source| StartupError::Locked {
                path: lock_path.clone(),
                source,
            })?;

        // Holding the lock means any existing socket file is stale.
        if path.exists() {
            fs::remove_file(path).map_err(publish_err)?;
        }
        let listener = UnixListener::bind(path).map_err(publish_err)?;

        tracing::info!(path = %path.display(), "Control socket published");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
            lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections until shutdown is signalled, then wait briefly for
    /// open connections to finish.
    pub async fn serve(&self, handle: ControllerHandle, shutdown: Arc<ShutdownManager>) {
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        shutdown.increment_connections();
                        let handle = handle.clone();
                        let shutdown = Arc::clone(&shutdown);
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, &handle, &shutdown).await {
                                tracing::debug!(error = %err, "Control connection ended with error");
                            }
                            shutdown.decrement_connections();
                        });
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to accept control connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }

        shutdown.wait_for_connections(CONNECTION_DRAIN_TIMEOUT).await;
    }

    /// Remove the socket file and drop the lock.
    pub fn unpublish(self) {
        let Self { listener, path, lock } = self;
        drop(listener);
        if let Err(err) = fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %err, "Failed to remove control socket");
        }
        if let Err(err) = FileExt::unlock(&lock) {
            tracing::warn!(error = %err, "Failed to release control lock");
        }
        tracing::info!(path = %path.display(), "Control socket removed");
    }
}

async fn handle_connection(
    stream: UnixStream,
    handle: &ControllerHandle,
    shutdown: &ShutdownManager,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let mut limited = (&mut reader).take((MAX_REQUEST_LINE + 1) as u64);
        let read = tokio::select! {
            _ = shutdown.wait() => return Ok(()),
            read = limited.read_line(&mut line) => read,
        };

        let read = match read {
            Ok(0) => return Ok(()),
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                let response = Response::bad_request(ProtocolError("request is not valid UTF-8".to_string()));
                writer.write_all(&response.encode()).await?;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if read > MAX_REQUEST_LINE {
            let response = Response::bad_request(ProtocolError(format!(
                "request line exceeds {} bytes",
                MAX_REQUEST_LINE
            )));
            writer.write_all(&response.encode()).await?;
            return Ok(());
        }

        let request_line = line.strip_suffix('\n').unwrap_or(&line);
        let response = match Request::parse(request_line) {
            Ok(request) => dispatch(handle, request),
            Err(err) => Response::bad_request(err),
        };
        writer.write_all(&response.encode()).await?;
    }
}

fn dispatch(handle: &ControllerHandle, request: Request) -> Response {
    let endpoints = handle.endpoints();
    match request {
        Request::List => {
            let mut body = endpoints.names().join("\n");
            body.push('\n');
            Response::ok(body)
        }
        Request::Read { endpoint } => match endpoints.read(&endpoint) {
            Ok(text) => Response::ok(text),
            Err(err) => err.into(),
        },
        Request::Write {
            endpoint,
            offset,
            payload,
        } => match endpoints.write(&endpoint, offset, &payload) {
            Ok(()) => Response::ok(Vec::new()),
            Err(err) => err.into(),
        },
        Request::Status => status_response(serde_json::to_string(&handle.status())),
    }
}

pub(super) fn status_response(encoded: serde_json::Result<String>) -> Response {
    match encoded {
        Ok(mut json) => {
            json.push('\n');
            Response::ok(json)
        }
        Err(err) => ControlError::ResourceUnavailable(format!("status encoding failed: {}", err)).into(),
    }
}
