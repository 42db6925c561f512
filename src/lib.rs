//! # ems-rs - A Rust Crate for Buderus/Bosch EMS Bus Communication
//!
//! The ems-rs crate implements the EMS (Energy Management System) and
//! EMS-plus heating bus protocols spoken by Buderus/Bosch boilers, room
//! controllers and their expansion modules. It powers `ems-collector`, a
//! long-running daemon that decodes bus telemetry into typed values and
//! accepts operator commands over a TCP socket and an MQTT broker.
//!
//! ## Features
//!
//! - Attach to the bus through a serial converter (read-only or writing)
//!   or a TCP bridge
//! - Decode classic EMS and extended EMS-plus frames into typed values
//!   with device/quantity/subsystem provenance and sensor validity
//! - Issue reads and writes as the bus "PC" peer: per-peer request pacing,
//!   response matching, pagination across bus round-trips, retry on
//!   timeout
//! - Translate line-oriented operator commands (heating circuit modes and
//!   setpoints, warm water, schedules, holiday ranges, date/time, raw
//!   reads/writes) into framed bus traffic
//! - Republish decoded values to hierarchical broker topics and accept
//!   commands from control topics
//!
//! ## Usage
//!
//! To use the ems-rs crate in your Rust project, add the following to your
//! Cargo.toml file:
//!
//! ```toml
//! [dependencies]
//! ems-rs = "0.3"
//! ```
//!
//! Then, in your Rust code, you can import the necessary modules and
//! types:
//!
//! ```rust
//! use ems_rs::{
//!     parse_frame, EmsFrame, EmsError, EmsValue, MessageDecoder,
//!     Quantity, Reading, Subsystem, ValueCache,
//! };
//! ```

pub mod cache;
pub mod collector;
pub mod command;
pub mod config;
pub mod constants;
pub mod ems;
pub mod error;
pub mod logging;
pub mod mqtt;
pub mod payload;
pub mod util;

pub use cache::ValueCache;
pub use collector::Collector;
pub use config::{Config, MqttConfig, RcType, TargetSpec};
pub use ems::{parse_frame, EmsFrame, Transport, TypeId};
pub use error::EmsError;
pub use logging::init_logger;
pub use payload::{EmsValue, MessageDecoder, Quantity, Reading, Subsystem};
