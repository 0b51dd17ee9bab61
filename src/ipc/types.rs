use std::path::PathBuf;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::ControlError;

/// Longest request line the server accepts, newline included.
pub const MAX_REQUEST_LINE: usize = 4096;
/// Largest response body a client accepts.
pub const MAX_RESPONSE_BODY: usize = 64 * 1024;

/// Malformed request or response framing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProtocolError(pub String);

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("Failed to connect to control socket '{path}': {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Control socket I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Control request timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{kind}: {message}")]
    Remote { kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List,
    Read {
        endpoint: String,
    },
    Write {
        endpoint: String,
        offset: u64,
        payload: Vec<u8>,
    },
    Status,
}

impl Request {
    /// Parse one request line (without its trailing newline).
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));

        match verb.to_ascii_uppercase().as_str() {
            "LIST" => Ok(Request::List),
            "STATUS" => Ok(Request::Status),
            "READ" => {
                let endpoint = rest.trim();
                if endpoint.is_empty() || endpoint.contains(' ') {
                    return Err(ProtocolError("usage: READ <endpoint>".to_string()));
                }
                Ok(Request::Read {
                    endpoint: endpoint.to_string(),
                })
            }
            "WRITE" => {
                let usage = || ProtocolError("usage: WRITE <endpoint> <offset> <payload>".to_string());
                let mut parts = rest.splitn(3, ' ');
                let endpoint = parts.next().filter(|s| !s.is_empty()).ok_or_else(usage)?;
                let offset = parts
                    .next()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(usage)?;
                let payload = decode_payload(parts.next().unwrap_or(""))?;
                Ok(Request::Write {
                    endpoint: endpoint.to_string(),
                    offset,
                    payload,
                })
            }
            "" => Err(ProtocolError("empty request".to_string())),
            other => Err(ProtocolError(format!("unknown request '{}'", other))),
        }
    }

    /// Encode as a request line, newline included.
    pub fn encode(&self) -> String {
        match self {
            Request::List => "LIST\n".to_string(),
            Request::Status => "STATUS\n".to_string(),
            Request::Read { endpoint } => format!("READ {}\n", endpoint),
            Request::Write {
                endpoint,
                offset,
                payload,
            } => format!("WRITE {} {} {}\n", endpoint, offset, encode_payload(payload)),
        }
    }
}

/// Escape a payload so it fits on one request line.
pub fn encode_payload(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Undo [`encode_payload`].
pub fn decode_payload(text: &str) -> Result<Vec<u8>, ProtocolError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => return Err(ProtocolError(format!("unknown escape '\\{}'", other))),
            None => return Err(ProtocolError("dangling '\\' at end of payload".to_string())),
        }
    }
    Ok(out.into_bytes())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(Vec<u8>),
    Err { kind: String, message: String },
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Response::Ok(body.into())
    }

    pub fn bad_request(err: ProtocolError) -> Self {
        Response::Err {
            kind: "bad_request".to_string(),
            message: err.0,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Response::Ok(body) => {
                let mut out = format!("OK {}\n", body.len()).into_bytes();
                out.extend_from_slice(body);
                out
            }
            Response::Err { kind, message } => {
                format!("ERR {} {}\n", kind, message.replace('\n', " ")).into_bytes()
            }
        }
    }

    /// Read one framed response.
    pub async fn read_from<R>(reader: &mut R) -> Result<Self, IpcError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut header = String::new();
        if reader.read_line(&mut header).await? == 0 {
            return Err(ProtocolError("connection closed before response".to_string()).into());
        }
        let header = header.trim_end_matches('\n');

        if let Some(len) = header.strip_prefix("OK ") {
            let len: usize = len
                .parse()
                .map_err(|_| ProtocolError(format!("bad length in '{}'", header)))?;
            if len > MAX_RESPONSE_BODY {
                return Err(ProtocolError(format!("response body of {} bytes is too large", len)).into());
            }
            let mut body = vec![0; len];
            reader.read_exact(&mut body).await?;
            return Ok(Response::Ok(body));
        }

        if let Some(rest) = header.strip_prefix("ERR ") {
            let (kind, message) = rest.split_once(' ').unwrap_or((rest, ""));
            return Ok(Response::Err {
                kind: kind.to_string(),
                message: message.to_string(),
            });
        }

        Err(ProtocolError(format!("unexpected response header '{}'", header)).into())
    }

    pub fn into_result(self) -> Result<Vec<u8>, IpcError> {
        match self {
            Response::Ok(body) => Ok(body),
            Response::Err { kind, message } => Err(IpcError::Remote { kind, message }),
        }
    }
}

impl From<ControlError> for Response {
    fn from(err: ControlError) -> Self {
        Response::Err {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
