//! # EMS Error Handling
//!
//! This module defines the EmsError enum, which represents the different error
//! types that can occur in the ems-rs crate.

use thiserror::Error;

/// Represents the different error types that can occur in the EMS crate.
#[derive(Debug, Error)]
pub enum EmsError {
    /// Indicates an error on the serial or TCP transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Indicates a frame that is shorter than its declared shape allows.
    #[error("Malformed frame: {0} bytes")]
    MalformedFrame(usize),

    /// Indicates an error when parsing an EMS frame.
    #[error("Error parsing EMS frame: {0}")]
    FrameParse(String),

    /// Indicates a write attempt on a read-only transport.
    #[error("Transport is read-only")]
    ReadOnlyTransport,

    /// Indicates an invalid transport target specification.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Indicates a broker connection problem.
    #[error("Broker error: {0}")]
    Broker(String),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for EmsError {
    fn from(err: std::io::Error) -> Self {
        EmsError::Transport(err.to_string())
    }
}
