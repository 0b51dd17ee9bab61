use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::controller::ControllerStatus;

use super::types::{IpcError, ProtocolError, Request, Response};

const IPC_TIMEOUT: Duration = Duration::from_secs(1);

/// One-request-per-connection client for the control socket.
#[derive(Clone)]
pub struct ControlClient {
    path: PathBuf,
    timeout: Duration,
}

impl ControlClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: IPC_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Result<Vec<String>, IpcError> {
        let body = self.request(&Request::List).await?;
        Ok(String::from_utf8_lossy(&body)
            .lines()
            .map(str::to_string)
            .collect())
    }

    pub async fn read(&self, endpoint: &str) -> Result<String, IpcError> {
        let body = self
            .request(&Request::Read {
                endpoint: endpoint.to_string(),
            })
            .await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn write(&self, endpoint: &str, offset: u64, payload: &[u8]) -> Result<(), IpcError> {
        self.request(&Request::Write {
            endpoint: endpoint.to_string(),
            offset,
            payload: payload.to_vec(),
        })
        .await?;
        Ok(())
    }

    pub async fn status(&self) -> Result<ControllerStatus, IpcError> {
        let body = self.request(&Request::Status).await?;
        serde_json::from_slice(&body)
            .map_err(|e| ProtocolError(format!("invalid status JSON: {}", e)).into())
    }

    async fn request(&self, request: &Request) -> Result<Vec<u8>, IpcError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(IpcError::Timeout),
        }
    }

    async fn exchange(&self, request: &Request) -> Result<Vec<u8>, IpcError> {
        let stream = UnixStream::connect(&self.path)
            .await
            .map_err(|source| IpcError::Connect {
                path: self.path.clone(),
                source,
            })?;
        let (reader, mut writer) = stream.into_split();
        writer.write_all(request.encode().as_bytes()).await?;

        let mut reader = BufReader::new(reader);
        Response::read_from(&mut reader).await?.into_result()
    }
}
