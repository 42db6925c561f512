//! # Operator Command Interface
//!
//! The line-oriented command grammar shared by the TCP command socket and
//! the broker control topics, and the TCP server feeding it.

pub mod parser;
pub mod server;

pub use parser::{parse_command, CommandAction, CommandError, ReadRequest, WriteRequest};
pub use server::{run_command_server, ClientRequest};
