//! # Logging Setup
//!
//! Logging goes through the `log` facade with `env_logger` as the sink. The
//! collector's three debug sinks from the command line (`io`, `message`,
//! `data`) map to the log targets below; selecting a sink raises its target
//! to debug level.

use env_logger::Builder;
use log::LevelFilter;

/// Target for raw transport byte traffic.
pub const IO: &str = "ems::io";

/// Target for decoded frame headers and composed send data.
pub const MESSAGE: &str = "ems::message";

/// Target for decoded values and unhandled message reports.
pub const DATA: &str = "ems::data";

/// Initializes the logger with the `env_logger` crate.
///
/// `debug_sinks` holds the selectors given on the command line; unknown
/// selectors are ignored. `RUST_LOG` still applies on top.
pub fn init_logger(debug_sinks: &[String]) {
    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    for sink in debug_sinks {
        let target = match sink.as_str() {
            "io" => IO,
            "message" => MESSAGE,
            "data" => DATA,
            _ => continue,
        };
        builder.filter_module(target, LevelFilter::Debug);
    }
    builder.init();
}
