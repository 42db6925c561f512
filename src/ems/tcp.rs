//! # EMS TCP Transport
//!
//! Attaches the collector to a network bridge (ser2net or an Ethernet
//! gateway) carrying the same framed byte stream as the serial converter.
//! The bridge inserts the bus source address itself, so outgoing frames are
//! rendered without the leading sender byte.

use crate::ems::framing::{envelope, FrameAccumulator};
use crate::ems::{EmsFrame, Transport};
use crate::error::EmsError;
use crate::logging;
use crate::util::hex::format_hex_compact;
use async_trait::async_trait;
use log::debug;
use std::collections::VecDeque;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// TCP bus attachment.
pub struct TcpTransport {
    stream: TcpStream,
    accumulator: FrameAccumulator,
    pending: VecDeque<Vec<u8>>,
}

impl TcpTransport {
    /// Connects to the bridge at `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<TcpTransport, EmsError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| EmsError::Transport(format!("{host}:{port}: {e}")))?;
        Ok(TcpTransport {
            stream,
            accumulator: FrameAccumulator::new(),
            pending: VecDeque::new(),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn recv(&mut self) -> Result<Vec<u8>, EmsError> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }

            let mut chunk = [0u8; 256];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(EmsError::Transport("connection closed by peer".into()));
            }
            debug!(target: logging::IO, "IO: got bytes {}", format_hex_compact(&chunk[..n]));

            for &byte in &chunk[..n] {
                if let Some(frame) = self.accumulator.push(byte) {
                    self.pending.push_back(frame);
                }
            }
        }
    }

    async fn send(&mut self, frame: &EmsFrame) -> Result<(), EmsError> {
        let wire = envelope(&frame.to_wire(true));
        debug!(target: logging::IO, "IO: sending bytes {}", format_hex_compact(&wire));
        self.stream.write_all(&wire).await?;
        Ok(())
    }

    fn writable(&self) -> bool {
        true
    }
}
