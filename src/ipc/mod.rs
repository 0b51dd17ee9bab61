//! Line-oriented control protocol over a Unix domain socket.
//!
//! One request per line, one framed response per request:
//!
//! ```text
//! LIST
//! READ <endpoint>
//! WRITE <endpoint> <offset> <payload>
//! STATUS
//! ```
//!
//! Responses are `OK <len>\n` followed by `len` body bytes, or
//! `ERR <kind> <message>\n`.

mod client;
mod server;
mod types;

pub use client::ControlClient;
pub use server::ControlServer;
pub use types::{decode_payload, encode_payload, IpcError, ProtocolError, Request, Response};
