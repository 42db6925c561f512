//! EMS Protocol Constants
//!
//! Bus addresses, well-known message type ids and protocol timings for the
//! Buderus/Bosch EMS and EMS-plus heating bus.

use std::time::Duration;

// ----------------------------------------------------------------------------
// Bus peer addresses
// ----------------------------------------------------------------------------

/// Burner control unit (classic generation)
pub const ADDR_UBA: u8 = 0x08;

/// BC10 base controller
pub const ADDR_BC10: u8 = 0x09;

/// RC30/RC35 room controller
pub const ADDR_RC3X: u8 = 0x10;

/// WM10 wall module
pub const ADDR_WM10: u8 = 0x11;

/// RC20 room controller, standalone
pub const ADDR_RC2X: u8 = 0x17;

/// RC20 room controllers assigned to heating circuits 1..4
pub const ADDR_RC2X_HK1: u8 = 0x18;
pub const ADDR_RC2X_HK2: u8 = 0x19;
pub const ADDR_RC2X_HK3: u8 = 0x1A;
pub const ADDR_RC2X_HK4: u8 = 0x1B;

/// MM10 mixer modules for heating circuits 1..4
pub const ADDR_MM10_HK1: u8 = 0x20;
pub const ADDR_MM10_HK2: u8 = 0x21;
pub const ADDR_MM10_HK3: u8 = 0x22;
pub const ADDR_MM10_HK4: u8 = 0x23;

/// SM10 solar module
pub const ADDR_SM10: u8 = 0x30;

/// Burner control unit (plus generation)
pub const ADDR_UBA2: u8 = 0x88;

/// This node. Used as the source address of every frame we put on the bus.
pub const ADDR_PC: u8 = 0x8B;

/// UI800 user interface / system controller
pub const ADDR_UI800: u8 = 0x90;

/// RH800 hybrid manager
pub const ADDR_RH800: u8 = 0xB8;

/// ConnectKey gateway
pub const ADDR_CONNECT_KEY: u8 = 0xC8;

/// Bit 7 of the destination field: a response is expected for this frame.
pub const RESPONSE_EXPECTED: u8 = 0x80;

// ----------------------------------------------------------------------------
// Message type ids
// ----------------------------------------------------------------------------

/// Version query, answered by most peers
pub const MSG_VERSION: u16 = 0x02;

/// System time record on the RC3x and UI800
pub const MSG_SYSTEM_TIME: u16 = 0x06;

/// Error log of the RC3x, read by `geterrors`
pub const MSG_RC_ERROR_LOG: u16 = 0x12;

/// UBA test mode enable
pub const MSG_UBA_TESTMODE: u16 = 0x1D;

/// UBA warm water parameters
pub const MSG_UBA_WW_PARAMS: u16 = 0x33;

/// RC3x warm water / circulation operation mode
pub const MSG_RC_WW_OPMODE: u16 = 0x37;

/// RC3x heating circuit operation mode messages, HK1..HK4
pub const MSG_HK_OPMODE: [u16; 4] = [0x3D, 0x47, 0x51, 0x5B];

/// RC3x heating circuit switch program, HK1..HK4
pub const MSG_HK_SCHEDULE: [u16; 4] = [0x42, 0x4C, 0x56, 0x60];

/// UI800 heating circuit settings (EMS-plus), HK1..HK4
pub const MSG_UI_HK_SETTINGS: [u16; 4] = [0x01B9, 0x01BA, 0x01BB, 0x01BC];

/// UI800 contact information text
pub const MSG_UI_CONTACT_INFO: u16 = 0x0137;

/// Classic type ids at or above this value signal an EMS-plus frame whose
/// real 16-bit type follows in the payload.
pub const EMS_PLUS_MARKER: u8 = 0xF0;

/// Synthetic classic type byte put on the wire for EMS-plus frames.
pub const EMS_PLUS_TYPE: u8 = 0xFF;

// ----------------------------------------------------------------------------
// Schedule / holiday layout on the RC3x schedule message
// ----------------------------------------------------------------------------

/// Number of switch points per weekly program
pub const SCHEDULE_ENTRY_COUNT: usize = 42;

/// Byte offset of the first holiday range inside the schedule message
pub const HOLIDAY_RANGE_OFFSET: u8 = 87;

/// Byte offset of the second (vacation) range inside the schedule message
pub const VACATION_RANGE_OFFSET: u8 = 93;

// ----------------------------------------------------------------------------
// Timings
// ----------------------------------------------------------------------------

/// Minimum idle gap between two frames sent to the same bus peer
pub const MIN_REQUEST_GAP: Duration = Duration::from_millis(100);

/// How long to wait for a response before retrying
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Delay after which a write without the response-expected bit is
/// acknowledged locally
pub const FAKE_ACK_DELAY: Duration = Duration::from_millis(200);

/// Total attempts per request frame; the last timeout fails the command
pub const MAX_REQUEST_ATTEMPTS: u8 = 3;

/// Interval of the test mode refresh writes
pub const TESTMODE_INTERVAL: Duration = Duration::from_secs(5);

/// Broker reconnect backoff bounds
pub const MQTT_RETRY_MIN: Duration = Duration::from_secs(5);
pub const MQTT_RETRY_MAX: Duration = Duration::from_secs(300);

/// Pause before reopening a failed transport
pub const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(10);
