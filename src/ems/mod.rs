//! # EMS Bus Engine
//!
//! This module contains the bus-facing half of the crate: the frame codec,
//! the stream framer shared by the serial and TCP transports, the send
//! scheduler enforcing the per-peer request gap, and the active-request
//! tracker that paginates reads and matches responses.

pub mod frame;
pub mod framing;
pub mod mock;
pub mod scheduler;
pub mod serial;
pub mod tcp;
pub mod tracker;

pub use frame::{parse_frame, EmsFrame, TypeId};
pub use scheduler::{Outgoing, SendScheduler};
pub use tracker::{RequestTracker, TimeoutAction, TrackerEffects, Verdict};

use crate::error::EmsError;
use async_trait::async_trait;

/// A bus attachment delivering one framed EMS message per call.
///
/// Framing (sync bytes, length, checksum) is internal to the transport; the
/// byte sequences exchanged here start at the source address. Transports
/// whose converter inserts the sender byte itself render outgoing frames
/// without it.
#[async_trait]
pub trait Transport: Send {
    /// Waits for the next complete frame from the bus.
    async fn recv(&mut self) -> Result<Vec<u8>, EmsError>;

    /// Puts a frame on the bus.
    async fn send(&mut self, frame: &EmsFrame) -> Result<(), EmsError>;

    /// Whether this transport can write to the bus at all.
    fn writable(&self) -> bool;
}
