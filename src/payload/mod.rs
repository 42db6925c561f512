//! # Payload Decoding
//!
//! Everything between raw frame bytes and typed telemetry: the fixed wire
//! records shared by decoder and command translator, the typed value model,
//! the (source, type) dispatch tables turning monitor messages into value
//! streams, and the English names used on broker topics and in command
//! output.

pub mod decode;
pub mod names;
pub mod records;
pub mod value;

pub use decode::MessageDecoder;
pub use records::{
    DateRecord, DateTimeRecord, ErrorRecord, HolidayEntry, ScheduleEntry, SystemTimeRecord,
};
pub use value::{EmsValue, ErrorEntry, Quantity, Reading, Subsystem};
