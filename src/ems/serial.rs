//! # EMS Serial Transport
//!
//! This module attaches the collector to an EMS interface circuit on a
//! serial port. The converter talks 9600 8N1 and wraps bus frames in the
//! sync/length/checksum envelope handled by [`crate::ems::framing`].
//!
//! Plain converters are receive-only; the `tx-serial:` target selects the
//! writing variant for converters with a transmit stage.

use crate::ems::framing::{envelope, FrameAccumulator};
use crate::ems::{EmsFrame, Transport};
use crate::error::EmsError;
use crate::logging;
use crate::util::hex::format_hex_compact;
use async_trait::async_trait;
use log::debug;
use std::collections::VecDeque;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

const BAUD_RATE: u32 = 9600;

/// Serial bus attachment.
pub struct SerialTransport {
    port: SerialStream,
    accumulator: FrameAccumulator,
    pending: VecDeque<Vec<u8>>,
    writable: bool,
}

impl SerialTransport {
    /// Opens `device` at the fixed EMS line settings.
    pub fn open(device: &str, writable: bool) -> Result<SerialTransport, EmsError> {
        let port = tokio_serial::new(device, BAUD_RATE)
            .open_native_async()
            .map_err(|e| EmsError::Transport(format!("{device}: {e}")))?;
        Ok(SerialTransport {
            port,
            accumulator: FrameAccumulator::new(),
            pending: VecDeque::new(),
            writable,
        })
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn recv(&mut self) -> Result<Vec<u8>, EmsError> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }

            let mut chunk = [0u8; 256];
            let n = self.port.read(&mut chunk).await?;
            if n == 0 {
                return Err(EmsError::Transport("serial port closed".into()));
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
        if !self.writable {
            return Err(EmsError::ReadOnlyTransport);
        }
        let wire = envelope(&frame.to_wire(false));
        debug!(target: logging::IO, "IO: sending bytes {}", format_hex_compact(&wire));
        self.port.write_all(&wire).await?;
        Ok(())
    }

    fn writable(&self) -> bool {
        self.writable
    }
}
