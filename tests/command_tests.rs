//! Unit tests for the command translator: grammar, argument validation
//! and the frame encodings behind each command.

use ems_rs::cache::ValueCache;
use ems_rs::command::{parse_command, CommandAction, CommandError, WriteRequest};
use ems_rs::constants::{
    ADDR_RC3X, ADDR_UBA, ADDR_UBA2, ADDR_UI800, MSG_RC_ERROR_LOG, MSG_UBA_WW_PARAMS,
    MSG_UI_CONTACT_INFO, MSG_VERSION,
};
use ems_rs::payload::value::{EmsValue, Quantity, Subsystem};

fn parse(line: &str) -> Result<CommandAction, CommandError> {
    parse_command(line, &ValueCache::new())
}

fn single_write(action: CommandAction) -> WriteRequest {
    match action {
        CommandAction::Write(mut writes) => {
            assert_eq!(writes.len(), 1);
            writes.pop().unwrap()
        }
        other => panic!("expected a write, got {other:?}"),
    }
}

#[test]
fn test_unknown_commands() {
    assert_eq!(parse("frobnicate").unwrap_err(), CommandError::InvalidCmd);
    assert_eq!(parse("hk1 frobnicate").unwrap_err(), CommandError::InvalidCmd);
    assert_eq!(parse("ww zirkpump what").unwrap_err(), CommandError::InvalidCmd);
}

#[test]
fn test_help_replies_without_bus_traffic() {
    match parse("help").unwrap() {
        CommandAction::Reply(lines) => assert!(!lines.is_empty()),
        other => panic!("expected a reply, got {other:?}"),
    }
    assert!(matches!(parse("hk2 help").unwrap(), CommandAction::Reply(_)));
    assert!(matches!(parse("rc help").unwrap(), CommandAction::Reply(_)));
}

#[test]
fn test_hk_manualtemp_half_degree_encoding() {
    let w = single_write(parse("hk1 manualtemp 21").unwrap());
    assert_eq!(w.dest, ADDR_UI800);
    assert_eq!(w.type_raw, 0x01B9);
    assert_eq!(w.offset, 22);
    assert_eq!(w.data, vec![42]);

    let w = single_write(parse("hk2 manualtemp 21.5").unwrap());
    assert_eq!(w.type_raw, 0x01BA);
    assert_eq!(w.data, vec![43]);

    assert_eq!(parse("hk1 manualtemp 4").unwrap_err(), CommandError::InvalidArgs);
    assert_eq!(parse("hk1 manualtemp 30.5").unwrap_err(), CommandError::InvalidArgs);
    assert_eq!(parse("hk1 manualtemp warm").unwrap_err(), CommandError::InvalidArgs);
}

#[test]
fn test_hk_boosttemp_uses_neighbouring_offset() {
    let w = single_write(parse("hk3 boosttemp 25").unwrap());
    assert_eq!(w.type_raw, 0x01BB);
    assert_eq!(w.offset, 23);
    assert_eq!(w.data, vec![50]);
}

#[test]
fn test_hk_mode_bytes() {
    assert_eq!(single_write(parse("hk1 mode off").unwrap()).data, vec![0]);
    assert_eq!(single_write(parse("hk1 mode manual").unwrap()).data, vec![1]);
    let w = single_write(parse("hk4 mode auto").unwrap());
    assert_eq!(w.data, vec![2]);
    assert_eq!(w.type_raw, 0x01BC);
    assert_eq!(w.offset, 0);
    assert_eq!(parse("hk1 mode party").unwrap_err(), CommandError::InvalidArgs);
}

#[test]
fn test_schedule_entry_command() {
    let w = single_write(parse("hk1 schedule 3 tuesday 06:30 on").unwrap());
    assert_eq!(w.dest, ADDR_RC3X);
    assert_eq!(w.type_raw, 0x42);
    assert_eq!(w.offset, 6);
    assert_eq!(w.data, vec![2, 39, 1]);

    let w = single_write(parse("hk2 schedule 1 sunday 23:50 off").unwrap());
    assert_eq!(w.type_raw, 0x4C);
    assert_eq!(w.offset, 0);
    assert_eq!(w.data, vec![12, 143, 0]);

    let w = single_write(parse("hk1 schedule 42 unset").unwrap());
    assert_eq!(w.offset, 123);
    assert_eq!(w.data, vec![0x0E, 0x90, 7]);
}

#[test]
fn test_schedule_argument_validation() {
    // minutes must land on the 10-minute raster
    assert_eq!(
        parse("hk1 schedule 3 tuesday 06:35 on").unwrap_err(),
        CommandError::InvalidArgs
    );
    assert_eq!(
        parse("hk1 schedule 0 tuesday 06:30 on").unwrap_err(),
        CommandError::InvalidArgs
    );
    assert_eq!(
        parse("hk1 schedule 43 tuesday 06:30 on").unwrap_err(),
        CommandError::InvalidArgs
    );
    assert_eq!(
        parse("hk1 schedule 3 caturday 06:30 on").unwrap_err(),
        CommandError::InvalidArgs
    );
    assert_eq!(
        parse("hk1 schedule 3 tuesday 24:00 on").unwrap_err(),
        CommandError::InvalidArgs
    );
    assert_eq!(
        parse("hk1 schedule 3 tuesday 06:30 maybe").unwrap_err(),
        CommandError::InvalidArgs
    );
}

#[test]
fn test_holiday_and_vacation_ranges() {
    let w = single_write(parse("hk1 holiday 2023-07-01 2023-07-14").unwrap());
    assert_eq!(w.dest, ADDR_RC3X);
    assert_eq!(w.type_raw, 0x42);
    assert_eq!(w.offset, 87);
    assert_eq!(w.data, vec![23, 7, 1, 23, 7, 14]);

    let w = single_write(parse("hk1 vacation 2024-01-02 2024-01-02").unwrap());
    assert_eq!(w.offset, 93);
    assert_eq!(w.data, vec![24, 1, 2, 24, 1, 2]);

    // begin must not be after end
    assert_eq!(
        parse("hk1 holiday 2023-07-14 2023-07-01").unwrap_err(),
        CommandError::InvalidArgs
    );
    assert_eq!(
        parse("hk1 holiday 1999-01-01 2023-07-01").unwrap_err(),
        CommandError::InvalidArgs
    );
}

#[test]
fn test_ww_commands() {
    let w = single_write(parse("ww temperature 60").unwrap());
    assert_eq!(w.dest, ADDR_UBA);
    assert_eq!(w.type_raw, MSG_UBA_WW_PARAMS);
    assert_eq!(w.offset, 2);
    assert_eq!(w.data, vec![60]);
    assert_eq!(parse("ww temperature 29").unwrap_err(), CommandError::InvalidArgs);
    assert_eq!(parse("ww temperature 81").unwrap_err(), CommandError::InvalidArgs);

    let w = single_write(parse("ww thermdesinfect mode on").unwrap());
    assert_eq!((w.dest, w.type_raw, w.offset), (ADDR_RC3X, 0x37, 4));
    assert_eq!(w.data, vec![0xFF]);
    assert_eq!(single_write(parse("ww thermdesinfect mode off").unwrap()).data, vec![0]);

    let w = single_write(parse("ww thermdesinfect day wednesday").unwrap());
    assert_eq!(w.offset, 5);
    assert_eq!(w.data, vec![2]);
    assert_eq!(single_write(parse("ww thermdesinfect day everyday").unwrap()).data, vec![7]);

    let w = single_write(parse("ww zirkpump mode auto").unwrap());
    assert_eq!((w.type_raw, w.offset), (0x37, 3));
    assert_eq!(w.data, vec![2]);

    let w = single_write(parse("ww zirkpump count alwayson").unwrap());
    assert_eq!((w.dest, w.type_raw, w.offset), (ADDR_UBA, 0x33, 7));
    assert_eq!(w.data, vec![7]);
    assert_eq!(single_write(parse("ww zirkpump count 3").unwrap()).data, vec![3]);
    assert_eq!(parse("ww zirkpump count 7").unwrap_err(), CommandError::InvalidArgs);
}

#[test]
fn test_rc_settime_record() {
    // 2023-07-06 is a Thursday (day of week 3)
    let w = single_write(parse("rc settime 2023-07-06 14:30:05").unwrap());
    assert_eq!(w.dest, ADDR_UI800);
    assert_eq!(w.type_raw, 0x06);
    assert_eq!(w.offset, 0);
    assert_eq!(w.data, vec![23, 7, 14, 6, 30, 5, 3, 0]);

    assert_eq!(parse("rc settime 2023-07-06").unwrap_err(), CommandError::InvalidArgs);
    assert_eq!(
        parse("rc settime 2023-13-06 14:30:05").unwrap_err(),
        CommandError::InvalidArgs
    );
}

#[test]
fn test_setcontactinfo_chunks() {
    let writes = match parse("rc setcontactinfo 2 Heating Co.").unwrap() {
        CommandAction::Write(writes) => writes,
        other => panic!("expected writes, got {other:?}"),
    };
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].dest, ADDR_UI800);
    assert_eq!(writes[0].type_raw, MSG_UI_CONTACT_INFO);
    // line 2 occupies offsets 40..80, split into two half lines
    assert_eq!(writes[0].offset, 40);
    assert_eq!(writes[1].offset, 60);
    assert_eq!(writes[0].data.len(), 20);
    assert_eq!(writes[1].data.len(), 20);

    // UTF-16BE, padded with spaces to 20 code units
    assert_eq!(&writes[0].data[0..4], &[0x00, b'H', 0x00, b'e']);
    assert_eq!(&writes[1].data[16..20], &[0x00, b' ', 0x00, b' ']);

    assert_eq!(parse("rc setcontactinfo 4 text").unwrap_err(), CommandError::InvalidArgs);
    assert_eq!(parse("rc setcontactinfo 1").unwrap_err(), CommandError::InvalidArgs);
}

#[test]
fn test_getversion_banner_and_read() {
    match parse("getversion").unwrap() {
        CommandAction::Read { lines, read } => {
            assert_eq!(lines.len(), 1);
            assert!(lines[0].starts_with("collector version: "));
            assert_eq!(read.dest, ADDR_UBA2);
            assert_eq!(read.type_raw, MSG_VERSION);
            assert_eq!((read.offset, read.length), (0, 3));
            assert!(!read.raw);
        }
        other => panic!("expected a read, got {other:?}"),
    }
}

#[test]
fn test_geterrors_reads_four_records() {
    match parse("geterrors").unwrap() {
        CommandAction::Read { read, .. } => {
            assert_eq!(read.dest, ADDR_RC3X);
            assert_eq!(read.type_raw, MSG_RC_ERROR_LOG);
            assert_eq!(read.length, 48);
        }
        other => panic!("expected a read, got {other:?}"),
    }
}

#[test]
fn test_testmode_commands() {
    assert_eq!(parse("uba testmode on").unwrap(), CommandAction::TestmodeOn);
    assert_eq!(parse("uba testmode off").unwrap(), CommandAction::TestmodeOff);
    assert_eq!(parse("uba testmode maybe").unwrap_err(), CommandError::InvalidArgs);
}

#[test]
fn test_cache_fetch_uses_the_cache() {
    let mut cache = ValueCache::new();
    cache.update(&EmsValue::enumeration(Quantity::OpMode, Subsystem::Hk1, 2));
    cache.update(&EmsValue::boolean(Quantity::FlameActive, Subsystem::None, 1, 0));

    match parse_command("cache fetch hk1", &cache).unwrap() {
        CommandAction::Reply(lines) => {
            assert_eq!(lines, vec!["hk1 opmode = auto".to_string()]);
        }
        other => panic!("expected a reply, got {other:?}"),
    }
}

#[cfg(feature = "raw-commands")]
#[test]
fn test_raw_commands_accept_hex_and_decimal() {
    match parse("raw read 0x88 0x02 0 3").unwrap() {
        CommandAction::Read { read, .. } => {
            assert_eq!(read.dest, 0x88);
            assert_eq!(read.type_raw, 0x02);
            assert_eq!((read.offset, read.length), (0, 3));
            assert!(read.raw);
        }
        other => panic!("expected a read, got {other:?}"),
    }

    let w = single_write(parse("raw write 8 0x1d 0 0x5a").unwrap());
    assert_eq!((w.dest, w.type_raw, w.offset), (8, 0x1D, 0));
    assert_eq!(w.data, vec![0x5A]);

    assert_eq!(parse("raw read 0x188 2 0 3").unwrap_err(), CommandError::InvalidArgs);
    assert_eq!(parse("raw write 8 2 0").unwrap_err(), CommandError::InvalidArgs);
}
