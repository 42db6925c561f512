//! # Byte Stream Framing
//!
//! The serial converter and the TCP bridge both wrap EMS frames in the same
//! envelope: the sync sequence `0xAA 0x55`, one length byte, `length` frame
//! bytes, and a closing XOR checksum over the frame bytes. This module
//! provides the incremental accumulator used on the receive path and the
//! envelope writer used on the send path.

use log::debug;

use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    Syncing,
    Length,
    Data,
    Checksum,
}

const SYNC1: u8 = 0xAA;
const SYNC2: u8 = 0x55;

/// Incremental frame accumulator.
///
/// Feed the raw byte stream through [`FrameAccumulator::push`]; every
/// completed, checksum-verified frame comes back as one buffer. Checksum
/// mismatches drop the frame silently and resync.
#[derive(Debug)]
pub struct FrameAccumulator {
    state: SyncState,
    sync_pos: usize,
    length: usize,
    checksum: u8,
    data: Vec<u8>,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        FrameAccumulator::new()
    }
}

impl FrameAccumulator {
    pub fn new() -> FrameAccumulator {
        FrameAccumulator {
            state: SyncState::Syncing,
            sync_pos: 0,
            length: 0,
            checksum: 0,
            // pre-alloc to avoid reallocations on the hot path
            data: Vec::with_capacity(256),
        }
    }

    /// Consumes one stream byte; returns a complete frame when one closes.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        match self.state {
            SyncState::Syncing => {
                if self.sync_pos == 1 && byte == SYNC2 {
                    self.state = SyncState::Length;
                    self.sync_pos = 0;
                } else if byte == SYNC1 {
                    self.sync_pos = 1;
                } else {
                    self.sync_pos = 0;
                }
                None
            }
            SyncState::Length => {
                self.length = byte as usize;
                self.checksum = 0;
                self.data.clear();
                self.state = if self.length == 0 {
                    SyncState::Checksum
                } else {
                    SyncState::Data
                };
                None
            }
            SyncState::Data => {
                self.data.push(byte);
                self.checksum ^= byte;
                if self.data.len() == self.length {
                    self.state = SyncState::Checksum;
                }
                None
            }
            SyncState::Checksum => {
                self.state = SyncState::Syncing;
                self.sync_pos = 0;
                if self.checksum == byte {
                    Some(std::mem::take(&mut self.data))
                } else {
                    debug!(target: logging::IO, "IO: dropping frame with bad checksum (got 0x{byte:02x}, want 0x{:02x})", self.checksum);
                    self.data.clear();
                    None
                }
            }
        }
    }
}

/// Wraps frame bytes in the wire envelope.
pub fn envelope(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + 4);
    out.push(SYNC1);
    out.push(SYNC2);
    out.push(frame.len() as u8);
    out.extend_from_slice(frame);
    out.push(frame.iter().fold(0, |acc, b| acc ^ b));
    out
}
