//! # Command Translator
//!
//! Parses one line of whitespace-separated ASCII tokens into bus actions:
//! one or more framed writes, a tracked read, or an immediate reply. The
//! translator is side-effect-free; the collector loop owns the scheduler
//! and tracker and executes the returned action.
//!
//! Heating-circuit setpoints target the UI800 generation over EMS-plus;
//! schedules, holiday ranges and the error log live on the RC3x classic
//! types.

use crate::cache::ValueCache;
use crate::constants::*;
use crate::payload::records::{
    HolidayEntry, ScheduleEntry, DAY_NAMES, ERROR_RECORD_SIZE, HOLIDAY_ENTRY_SIZE,
    SCHEDULE_ENTRY_SIZE,
};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::str::SplitWhitespace;

/// Why a command line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command or subcommand.
    InvalidCmd,
    /// Argument missing, out of range or unparseable.
    InvalidArgs,
}

/// One framed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub dest: u8,
    pub type_raw: u16,
    pub offset: u8,
    pub data: Vec<u8>,
}

/// One tracked read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub dest: u8,
    pub type_raw: u16,
    pub offset: u8,
    pub length: usize,
    pub raw: bool,
}

/// What a parsed line asks the collector to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandAction {
    /// Output the lines and report OK.
    Reply(Vec<String>),
    /// Send the writes; the last one is acknowledged before OK.
    Write(Vec<WriteRequest>),
    /// Output `lines`, then run the read through the request tracker.
    Read { lines: Vec<String>, read: ReadRequest },
    /// Arm the periodic test mode refresh.
    TestmodeOn,
    /// Cancel the refresh and clear the test mode byte.
    TestmodeOff,
}

type Tokens<'a> = SplitWhitespace<'a>;

/// Parses one command line. The cache backs the `cache fetch` command.
pub fn parse_command(line: &str, cache: &ValueCache) -> Result<CommandAction, CommandError> {
    let mut tokens = line.split_whitespace();
    let category = tokens.next().ok_or(CommandError::InvalidCmd)?;

    match category {
        "help" => Ok(CommandAction::Reply(help_lines())),
        "hk1" => hk_command(1, &mut tokens),
        "hk2" => hk_command(2, &mut tokens),
        "hk3" => hk_command(3, &mut tokens),
        "hk4" => hk_command(4, &mut tokens),
        "ww" => ww_command(&mut tokens),
        "uba" => uba_command(&mut tokens),
        "rc" => rc_command(&mut tokens, line),
        "cache" => cache_command(&mut tokens, cache),
        "getversion" => Ok(CommandAction::Read {
            lines: vec![format!("collector version: {}", env!("CARGO_PKG_VERSION"))],
            read: ReadRequest {
                dest: ADDR_UBA2,
                type_raw: MSG_VERSION,
                offset: 0,
                length: 3,
                raw: false,
            },
        }),
        "geterrors" => Ok(CommandAction::Read {
            lines: Vec::new(),
            read: ReadRequest {
                dest: ADDR_RC3X,
                type_raw: MSG_RC_ERROR_LOG,
                offset: 0,
                length: 4 * ERROR_RECORD_SIZE,
                raw: false,
            },
        }),
        #[cfg(feature = "raw-commands")]
        "raw" => raw_command(&mut tokens),
        _ => Err(CommandError::InvalidCmd),
    }
}

fn help_lines() -> Vec<String> {
    let mut lines = vec!["Available commands (help with '<command> help'):".to_string()];
    for cmd in ["hk[1|2|3|4]", "ww", "uba", "rc", "cache", "getversion", "geterrors"] {
        lines.push(cmd.to_string());
    }
    #[cfg(feature = "raw-commands")]
    lines.push("raw".to_string());
    lines
}

fn hk_command(circuit: usize, tokens: &mut Tokens<'_>) -> Result<CommandAction, CommandError> {
    let settings_type = MSG_UI_HK_SETTINGS[circuit - 1];
    let schedule_type = MSG_HK_SCHEDULE[circuit - 1];
    let cmd = tokens.next().ok_or(CommandError::InvalidCmd)?;

    match cmd {
        "help" => Ok(CommandAction::Reply(
            [
                "Available subcommands:",
                "mode off|manual|auto",
                "manualtemp <temp>",
                "boosttemp <temp>",
                "schedule <index> <day> <HH:MM> on|off",
                "schedule <index> unset",
                "getschedule",
                "holiday <begin> <end> (dates as YYYY-MM-DD)",
                "vacation <begin> <end> (dates as YYYY-MM-DD)",
                "getholiday",
                "getvacation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )),
        "mode" => {
            let mode = match tokens.next() {
                Some("off") => 0x00,
                Some("manual") => 0x01,
                Some("auto") => 0x02,
                _ => return Err(CommandError::InvalidArgs),
            };
            Ok(single_write(ADDR_UI800, settings_type, 0, mode))
        }
        "manualtemp" => half_degree_write(tokens, ADDR_UI800, settings_type, 22, 5.0, 30.0),
        "boosttemp" => half_degree_write(tokens, ADDR_UI800, settings_type, 23, 5.0, 30.0),
        "schedule" => {
            let index: usize = tokens
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or(CommandError::InvalidArgs)?;
            if !(1..=SCHEDULE_ENTRY_COUNT).contains(&index) {
                return Err(CommandError::InvalidArgs);
            }
            let entry = parse_schedule_entry(tokens)?;
            let offset = ((index - 1) * SCHEDULE_ENTRY_SIZE) as u8;
            Ok(CommandAction::Write(vec![WriteRequest {
                dest: ADDR_RC3X,
                type_raw: schedule_type,
                offset,
                data: entry.encode().to_vec(),
            }]))
        }
        "getschedule" => Ok(CommandAction::Read {
            lines: Vec::new(),
            read: ReadRequest {
                dest: ADDR_RC3X,
                type_raw: schedule_type,
                offset: 0,
                length: SCHEDULE_ENTRY_COUNT * SCHEDULE_ENTRY_SIZE,
                raw: false,
            },
        }),
        "holiday" => holiday_write(tokens, schedule_type, HOLIDAY_RANGE_OFFSET),
        "vacation" => holiday_write(tokens, schedule_type, VACATION_RANGE_OFFSET),
        "getholiday" => Ok(holiday_read(schedule_type, HOLIDAY_RANGE_OFFSET)),
        "getvacation" => Ok(holiday_read(schedule_type, VACATION_RANGE_OFFSET)),
        _ => Err(CommandError::InvalidCmd),
    }
}

fn ww_command(tokens: &mut Tokens<'_>) -> Result<CommandAction, CommandError> {
    let cmd = tokens.next().ok_or(CommandError::InvalidCmd)?;

    match cmd {
        "help" => Ok(CommandAction::Reply(
            [
                "Available subcommands:",
                "temperature <30..80>",
                "thermdesinfect mode on|off",
                "thermdesinfect day <day>|everyday",
                "thermdesinfect temperature <60..80>",
                "zirkpump mode on|off|auto",
                "zirkpump count <1..6>|alwayson",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )),
        "temperature" => {
            let value = parse_ranged_int(tokens, 30, 80)?;
            Ok(single_write(ADDR_UBA, MSG_UBA_WW_PARAMS, 2, value))
        }
        "thermdesinfect" => match tokens.next() {
            Some("mode") => {
                let value = match tokens.next() {
                    Some("on") => 0xFF,
                    Some("off") => 0x00,
                    _ => return Err(CommandError::InvalidArgs),
                };
                Ok(single_write(ADDR_RC3X, MSG_RC_WW_OPMODE, 4, value))
            }
            Some("day") => {
                let day = match tokens.next() {
                    Some("everyday") => 7,
                    Some(name) => parse_day(name).ok_or(CommandError::InvalidArgs)?,
                    None => return Err(CommandError::InvalidArgs),
                };
                Ok(single_write(ADDR_RC3X, MSG_RC_WW_OPMODE, 5, day))
            }
            Some("temperature") => {
                let value = parse_ranged_int(tokens, 60, 80)?;
                Ok(single_write(ADDR_UBA, MSG_UBA_WW_PARAMS, 8, value))
            }
            _ => Err(CommandError::InvalidCmd),
        },
        "zirkpump" => match tokens.next() {
            Some("mode") => {
                let value = match tokens.next() {
                    Some("on") => 0x01,
                    Some("off") => 0x00,
                    Some("auto") => 0x02,
                    _ => return Err(CommandError::InvalidArgs),
                };
                Ok(single_write(ADDR_RC3X, MSG_RC_WW_OPMODE, 3, value))
            }
            Some("count") => {
                let value = match tokens.next() {
                    Some("alwayson") => 7,
                    Some(token) => {
                        let count: u8 = token.parse().map_err(|_| CommandError::InvalidArgs)?;
                        if !(1..=6).contains(&count) {
                            return Err(CommandError::InvalidArgs);
                        }
                        count
                    }
                    None => return Err(CommandError::InvalidArgs),
                };
                Ok(single_write(ADDR_UBA, MSG_UBA_WW_PARAMS, 7, value))
            }
            _ => Err(CommandError::InvalidCmd),
        },
        _ => Err(CommandError::InvalidCmd),
    }
}

fn uba_command(tokens: &mut Tokens<'_>) -> Result<CommandAction, CommandError> {
    let cmd = tokens.next().ok_or(CommandError::InvalidCmd)?;

    match cmd {
        "help" => Ok(CommandAction::Reply(
            ["Available subcommands:", "testmode on|off"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )),
        "testmode" => match tokens.next() {
            Some("on") => Ok(CommandAction::TestmodeOn),
            Some("off") => Ok(CommandAction::TestmodeOff),
            _ => Err(CommandError::InvalidArgs),
        },
        _ => Err(CommandError::InvalidCmd),
    }
}

fn rc_command(tokens: &mut Tokens<'_>, line: &str) -> Result<CommandAction, CommandError> {
    let cmd = tokens.next().ok_or(CommandError::InvalidCmd)?;

    match cmd {
        "help" => Ok(CommandAction::Reply(
            [
                "Available subcommands:",
                "settime YYYY-MM-DD HH:MM:SS",
                "setcontactinfo <1..3> <text>",
                "getcontactinfo",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )),
        "settime" => {
            let date = tokens.next().ok_or(CommandError::InvalidArgs)?;
            let time = tokens.next().ok_or(CommandError::InvalidArgs)?;
            let record = parse_system_time(date, time)?;
            Ok(CommandAction::Write(vec![WriteRequest {
                dest: ADDR_UI800,
                type_raw: MSG_SYSTEM_TIME,
                offset: 0,
                data: record.to_vec(),
            }]))
        }
        "setcontactinfo" => {
            let line_no: u8 = tokens
                .next()
                .and_then(|t| t.parse().ok())
                .ok_or(CommandError::InvalidArgs)?;
            if !(1..=3).contains(&line_no) {
                return Err(CommandError::InvalidArgs);
            }
            // the text is everything after the line number, verbatim
            let mut rest = line;
            for _ in 0..3 {
                rest = rest.trim_start();
                match rest.find(char::is_whitespace) {
                    Some(pos) => rest = &rest[pos..],
                    None => return Err(CommandError::InvalidArgs),
                }
            }
            let text = rest.trim();
            if text.is_empty() {
                return Err(CommandError::InvalidArgs);
            }
            Ok(CommandAction::Write(contact_info_writes(line_no, text)))
        }
        "getcontactinfo" => Ok(CommandAction::Read {
            lines: Vec::new(),
            read: ReadRequest {
                dest: ADDR_UI800,
                type_raw: MSG_UI_CONTACT_INFO,
                offset: 0,
                length: 120,
                raw: false,
            },
        }),
        _ => Err(CommandError::InvalidCmd),
    }
}

fn cache_command(tokens: &mut Tokens<'_>, cache: &ValueCache) -> Result<CommandAction, CommandError> {
    let cmd = tokens.next().ok_or(CommandError::InvalidCmd)?;

    match cmd {
        "help" => Ok(CommandAction::Reply(
            ["Available subcommands:", "fetch <selector>"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )),
        "fetch" => {
            let selector: Vec<String> = tokens.map(|t| t.to_string()).collect();
            Ok(CommandAction::Reply(cache.dump(&selector)))
        }
        _ => Err(CommandError::InvalidCmd),
    }
}

#[cfg(feature = "raw-commands")]
fn raw_command(tokens: &mut Tokens<'_>) -> Result<CommandAction, CommandError> {
    let cmd = tokens.next().ok_or(CommandError::InvalidCmd)?;

    match cmd {
        "help" => Ok(CommandAction::Reply(
            [
                "Available subcommands:",
                "read <target> <type> <offset> <len>",
                "write <target> <type> <offset> <data>",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )),
        "read" => {
            let dest = parse_int(tokens.next(), u8::MAX as u64)? as u8;
            let type_raw = parse_int(tokens.next(), u16::MAX as u64)? as u16;
            let offset = parse_int(tokens.next(), u8::MAX as u64)? as u8;
            let length = parse_int(tokens.next(), u8::MAX as u64)? as usize;
            Ok(CommandAction::Read {
                lines: Vec::new(),
                read: ReadRequest {
                    dest,
                    type_raw,
                    offset,
                    length,
                    raw: true,
                },
            })
        }
        "write" => {
            let dest = parse_int(tokens.next(), u8::MAX as u64)? as u8;
            let type_raw = parse_int(tokens.next(), u16::MAX as u64)? as u16;
            let offset = parse_int(tokens.next(), u8::MAX as u64)? as u8;
            let value = parse_int(tokens.next(), u8::MAX as u64)? as u8;
            Ok(single_write(dest, type_raw, offset, value))
        }
        _ => Err(CommandError::InvalidCmd),
    }
}

// ----------------------------------------------------------------------------
// Argument helpers
// ----------------------------------------------------------------------------

fn single_write(dest: u8, type_raw: u16, offset: u8, value: u8) -> CommandAction {
    CommandAction::Write(vec![WriteRequest {
        dest,
        type_raw,
        offset,
        data: vec![value],
    }])
}

/// Accepts decimal or 0x-prefixed hex, bounded by `max`.
#[cfg(feature = "raw-commands")]
fn parse_int(token: Option<&str>, max: u64) -> Result<u64, CommandError> {
    let token = token.ok_or(CommandError::InvalidArgs)?;
    let value = if let Some(hex) = token.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        token.parse()
    }
    .map_err(|_| CommandError::InvalidArgs)?;
    if value > max {
        return Err(CommandError::InvalidArgs);
    }
    Ok(value)
}

fn parse_ranged_int(tokens: &mut Tokens<'_>, min: u8, max: u8) -> Result<u8, CommandError> {
    let value: u8 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or(CommandError::InvalidArgs)?;
    if !(min..=max).contains(&value) {
        return Err(CommandError::InvalidArgs);
    }
    Ok(value)
}

/// Half-degree encoded temperature write: byte = round(2 * value).
fn half_degree_write(
    tokens: &mut Tokens<'_>,
    dest: u8,
    type_raw: u16,
    offset: u8,
    min: f64,
    max: f64,
) -> Result<CommandAction, CommandError> {
    let value: f64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or(CommandError::InvalidArgs)?;
    let scaled = (2.0 * value).round();
    if scaled < 2.0 * min || scaled > 2.0 * max {
        return Err(CommandError::InvalidArgs);
    }
    Ok(single_write(dest, type_raw, offset, scaled as u8))
}

fn parse_day(name: &str) -> Option<u8> {
    DAY_NAMES.iter().position(|&d| d == name).map(|i| i as u8)
}

/// `<day> <HH:MM> on|off`, or the literal `unset`.
fn parse_schedule_entry(tokens: &mut Tokens<'_>) -> Result<ScheduleEntry, CommandError> {
    let day = tokens.next().ok_or(CommandError::InvalidArgs)?;
    if day == "unset" {
        return Ok(ScheduleEntry::unset());
    }
    let weekday = parse_day(day).ok_or(CommandError::InvalidArgs)?;

    let time = tokens.next().ok_or(CommandError::InvalidArgs)?;
    let (hours, minutes) = time.split_once(':').ok_or(CommandError::InvalidArgs)?;
    let hours: u8 = hours.parse().map_err(|_| CommandError::InvalidArgs)?;
    let minutes: u8 = minutes.parse().map_err(|_| CommandError::InvalidArgs)?;
    if hours > 23 || minutes >= 60 || minutes % 10 != 0 {
        return Err(CommandError::InvalidArgs);
    }

    let on = match tokens.next() {
        Some("on") => true,
        Some("off") => false,
        _ => return Err(CommandError::InvalidArgs),
    };

    Ok(ScheduleEntry::from_parts(weekday, hours, minutes, on))
}

fn holiday_write(
    tokens: &mut Tokens<'_>,
    schedule_type: u16,
    offset: u8,
) -> Result<CommandAction, CommandError> {
    let begin = parse_holiday_entry(tokens.next())?;
    let end = parse_holiday_entry(tokens.next())?;
    if begin.ordinal() > end.ordinal() {
        return Err(CommandError::InvalidArgs);
    }

    let mut data = Vec::with_capacity(2 * HOLIDAY_ENTRY_SIZE);
    data.extend_from_slice(&begin.encode());
    data.extend_from_slice(&end.encode());
    Ok(CommandAction::Write(vec![WriteRequest {
        dest: ADDR_RC3X,
        type_raw: schedule_type,
        offset,
        data,
    }]))
}

fn holiday_read(schedule_type: u16, offset: u8) -> CommandAction {
    CommandAction::Read {
        lines: Vec::new(),
        read: ReadRequest {
            dest: ADDR_RC3X,
            type_raw: schedule_type,
            offset,
            length: 2 * HOLIDAY_ENTRY_SIZE,
            raw: false,
        },
    }
}

/// `YYYY-MM-DD` into a holiday wire entry.
fn parse_holiday_entry(token: Option<&str>) -> Result<HolidayEntry, CommandError> {
    let token = token.ok_or(CommandError::InvalidArgs)?;
    let mut parts = token.splitn(3, '-');
    let year: u16 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or(CommandError::InvalidArgs)?;
    let month: u8 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or(CommandError::InvalidArgs)?;
    let day: u8 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or(CommandError::InvalidArgs)?;
    HolidayEntry::from_date(year, month, day).ok_or(CommandError::InvalidArgs)
}

/// `YYYY-MM-DD HH:MM:SS` into the 8-byte system time record.
fn parse_system_time(date: &str, time: &str) -> Result<[u8; 8], CommandError> {
    let stamp = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| CommandError::InvalidArgs)?;
    let year = stamp.year();
    if !(2000..=2127).contains(&year) {
        return Err(CommandError::InvalidArgs);
    }
    Ok([
        (year - 2000) as u8,
        stamp.month() as u8,
        stamp.hour() as u8,
        stamp.day() as u8,
        stamp.minute() as u8,
        stamp.second() as u8,
        stamp.weekday().num_days_from_monday() as u8,
        0,
    ])
}

/// Pads the UTF-8 text with spaces to 20 UTF-16 code units and splits the
/// big-endian encoding into the two half-line chunks of contact info line
/// `line_no`.
fn contact_info_writes(line_no: u8, text: &str) -> Vec<WriteRequest> {
    let mut units: Vec<u16> = text.encode_utf16().collect();
    units.resize(20, b' ' as u16);

    let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_be_bytes()).collect();
    (0..2)
        .map(|chunk| WriteRequest {
            dest: ADDR_UI800,
            type_raw: MSG_UI_CONTACT_INFO,
            offset: (chunk * 20 + (line_no as usize - 1) * 40) as u8,
            data: bytes[chunk * 20..(chunk + 1) * 20].to_vec(),
        })
        .collect()
}
