//! # Mock Transport
//!
//! An in-memory [`Transport`] backed by channels, used by the integration
//! tests to drive the collector without a bus: inject raw frames as if they
//! came from the converter, observe every frame the collector sends.

use crate::ems::{EmsFrame, Transport};
use crate::error::EmsError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Test-side handle to a [`MockTransport`].
pub struct MockBus {
    /// Raw inbound frames, as the framer would deliver them.
    pub inject: mpsc::UnboundedSender<Vec<u8>>,
    /// Everything the collector put on the bus.
    pub sent: mpsc::UnboundedReceiver<EmsFrame>,
}

/// Channel-backed bus attachment for tests.
pub struct MockTransport {
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    outbound: mpsc::UnboundedSender<EmsFrame>,
    writable: bool,
}

impl MockTransport {
    pub fn new() -> (MockTransport, MockBus) {
        MockTransport::with_writable(true)
    }

    pub fn with_writable(writable: bool) -> (MockTransport, MockBus) {
        let (inject, inbound) = mpsc::unbounded_channel();
        let (outbound, sent) = mpsc::unbounded_channel();
        (
            MockTransport {
                inbound,
                outbound,
                writable,
            },
            MockBus { inject, sent },
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn recv(&mut self) -> Result<Vec<u8>, EmsError> {
        self.inbound
            .recv()
            .await
            .ok_or_else(|| EmsError::Transport("mock bus closed".into()))
    }

    async fn send(&mut self, frame: &EmsFrame) -> Result<(), EmsError> {
        if !self.writable {
            return Err(EmsError::ReadOnlyTransport);
        }
        self.outbound
            .send(frame.clone())
            .map_err(|_| EmsError::Transport("mock bus closed".into()))
    }

    fn writable(&self) -> bool {
        self.writable
    }
}
