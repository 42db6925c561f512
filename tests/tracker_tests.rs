//! Unit tests for the active-request state machine: pagination, response
//! matching, retries and the per-type response handlers.

use ems_rs::constants::{
    ADDR_RC3X, ADDR_UBA2, ADDR_UI800, MAX_REQUEST_ATTEMPTS, MSG_RC_ERROR_LOG, MSG_UI_CONTACT_INFO,
    MSG_VERSION,
};
use ems_rs::ems::frame::{EmsFrame, TypeId};
use ems_rs::ems::tracker::{RequestTracker, TimeoutAction, Verdict};

/// A response frame as the decoder would deliver it: `source` answering to
/// the PC with `payload` at `offset`.
fn response(source: u8, type_raw: u16, offset: u8, payload: &[u8]) -> EmsFrame {
    EmsFrame {
        source,
        dest: 0x0B,
        type_id: TypeId::from_raw(type_raw),
        offset,
        payload: payload.to_vec(),
    }
}

fn ack(offset: u8) -> EmsFrame {
    EmsFrame {
        source: 0x90,
        dest: 0x0B,
        type_id: TypeId::Classic(0xFF),
        offset,
        payload: Vec::new(),
    }
}

#[test]
fn test_read_request_shape() {
    let mut tracker = RequestTracker::new();
    assert!(!tracker.is_busy());

    let frame = tracker.start_read(ADDR_UBA2, MSG_VERSION, 0, 3, false).unwrap();
    assert!(tracker.is_busy());
    assert!(frame.expects_response());
    assert_eq!(frame.dest, ADDR_UBA2 | 0x80);
    assert_eq!(frame.type_raw(), MSG_VERSION);
    assert_eq!(frame.offset, 0);
    // the payload is the single remaining-length byte
    assert_eq!(frame.payload, vec![3]);
}

#[test]
fn test_pagination_requests_remaining_bytes() {
    let mut tracker = RequestTracker::new();
    let first = tracker.start_read(ADDR_RC3X, 0x42, 4, 30, true).unwrap();
    assert_eq!(first.offset, 4);
    assert_eq!(first.payload, vec![30]);

    let (verdict, fx) = tracker.handle_frame(&response(ADDR_RC3X, 0x42, 4, &[0u8; 12]));
    assert_eq!(verdict, Verdict::Pending);
    let next = fx.send.unwrap();
    assert_eq!(next.offset, 16);
    assert_eq!(next.payload, vec![18]);
}

#[test]
fn test_raw_read_renders_hex() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_UBA2, 0x02, 0, 2, true).unwrap();

    let (verdict, fx) = tracker.handle_frame(&response(ADDR_UBA2, 0x02, 0, &[0x01, 0xA5]));
    assert_eq!(verdict, Verdict::Done);
    assert_eq!(fx.lines, vec!["0x01 0xa5".to_string()]);
    assert!(!tracker.is_busy());
}

#[test]
fn test_empty_payload_ends_the_read() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_UBA2, 0x02, 0, 20, true).unwrap();

    let (verdict, _) = tracker.handle_frame(&response(ADDR_UBA2, 0x02, 0, &[0x11, 0x22]));
    assert_eq!(verdict, Verdict::Pending);

    // no further data available: the device answers with an empty payload
    let (verdict, fx) = tracker.handle_frame(&response(ADDR_UBA2, 0x02, 2, &[]));
    assert_eq!(verdict, Verdict::Done);
    assert_eq!(fx.lines, vec!["0x11 0x22".to_string()]);
}

#[test]
fn test_stale_responses_are_not_mine() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_UBA2, 0x02, 0, 3, false).unwrap();

    // wrong source
    let (verdict, _) = tracker.handle_frame(&response(ADDR_UI800, 0x02, 0, &[0, 4, 17]));
    assert_eq!(verdict, Verdict::NotMine);
    // wrong type
    let (verdict, _) = tracker.handle_frame(&response(ADDR_UBA2, 0x03, 0, &[0, 4, 17]));
    assert_eq!(verdict, Verdict::NotMine);
    // offset of an already retried page
    let (verdict, _) = tracker.handle_frame(&response(ADDR_UBA2, 0x02, 1, &[4, 17]));
    assert_eq!(verdict, Verdict::NotMine);
    // the active request is untouched
    assert!(tracker.is_busy());
}

#[test]
fn test_no_active_request_is_not_mine() {
    let mut tracker = RequestTracker::new();
    let (verdict, _) = tracker.handle_frame(&response(ADDR_UBA2, 0x02, 0, &[0, 4, 17]));
    assert_eq!(verdict, Verdict::NotMine);
}

#[test]
fn test_ack_completes_and_rejection_fails() {
    let mut tracker = RequestTracker::new();
    tracker.start_write(ADDR_UI800, 0x01B9, 22, vec![42]);
    let (verdict, _) = tracker.handle_frame(&ack(0x01));
    assert_eq!(verdict, Verdict::Done);
    assert!(!tracker.is_busy());

    tracker.start_write(ADDR_UI800, 0x01B9, 22, vec![42]);
    let (verdict, _) = tracker.handle_frame(&ack(0x04));
    assert_eq!(verdict, Verdict::Failed);
    assert!(!tracker.is_busy());
}

#[test]
fn test_write_ignores_data_frames() {
    let mut tracker = RequestTracker::new();
    tracker.start_write(ADDR_UI800, 0x01B9, 22, vec![42]);
    let (verdict, _) = tracker.handle_frame(&response(ADDR_UI800, 0x01B9, 22, &[42]));
    assert_eq!(verdict, Verdict::NotMine);
}

#[test]
fn test_timeout_retries_then_fails() {
    let mut tracker = RequestTracker::new();
    let first = tracker.start_read(ADDR_UBA2, 0x02, 0, 3, false).unwrap();

    for _ in 1..MAX_REQUEST_ATTEMPTS {
        match tracker.on_timeout() {
            TimeoutAction::Resend(frame) => assert_eq!(frame, first),
            other => panic!("expected resend, got {other:?}"),
        }
    }
    assert_eq!(tracker.on_timeout(), TimeoutAction::Fail);
    assert!(!tracker.is_busy());
    assert_eq!(tracker.on_timeout(), TimeoutAction::Idle);
}

#[test]
fn test_getversion_chains_through_all_devices() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_UBA2, MSG_VERSION, 0, 3, false).unwrap();

    let (verdict, fx) = tracker.handle_frame(&response(ADDR_UBA2, MSG_VERSION, 0, &[0, 4, 17]));
    assert_eq!(verdict, Verdict::Pending);
    assert_eq!(fx.lines, vec!["UBA2 version: 4.17".to_string()]);
    let next = fx.send.unwrap();
    assert_eq!(next.dest & 0x7F, ADDR_UI800 & 0x7F);
    assert_eq!(next.type_raw(), MSG_VERSION);

    let (verdict, fx) = tracker.handle_frame(&response(ADDR_UI800, MSG_VERSION, 0, &[0, 3, 5]));
    assert_eq!(verdict, Verdict::Pending);
    assert_eq!(fx.lines, vec!["UI800 version: 3.05".to_string()]);
    let next = fx.send.unwrap();
    assert_eq!(next.dest, 0xB8);

    let (verdict, fx) = tracker.handle_frame(&response(0xB8, MSG_VERSION, 0, &[0, 1, 0]));
    assert_eq!(verdict, Verdict::Done);
    assert_eq!(fx.lines, vec!["RH800 version: 1.00".to_string()]);
    assert!(!tracker.is_busy());
}

fn error_record(code: &[u8; 2]) -> Vec<u8> {
    let mut record = vec![code[0], code[1], 0x02, 0x04];
    record.extend_from_slice(&[0x80 | 23, 5, 12, 1, 34]);
    record.extend_from_slice(&[0x00, 0x14, 0x10]);
    record
}

#[test]
fn test_error_log_paginates_and_numbers_records() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_RC3X, MSG_RC_ERROR_LOG, 0, 48, false).unwrap();

    let (verdict, fx) =
        tracker.handle_frame(&response(ADDR_RC3X, MSG_RC_ERROR_LOG, 0, &error_record(b"A1")));
    assert_eq!(verdict, Verdict::Pending);
    assert_eq!(fx.lines, vec!["01 2023-05-01 12:34 10 A1 516 20".to_string()]);
    assert_eq!(fx.send.unwrap().offset, 12);

    let (verdict, fx) =
        tracker.handle_frame(&response(ADDR_RC3X, MSG_RC_ERROR_LOG, 12, &error_record(b"b2")));
    assert_eq!(verdict, Verdict::Pending);
    assert_eq!(fx.lines, vec!["02 2023-05-01 12:34 10 b2 516 20".to_string()]);

    // an empty slot terminates the log early
    let (verdict, fx) = tracker.handle_frame(&response(ADDR_RC3X, MSG_RC_ERROR_LOG, 24, &[0u8; 12]));
    assert_eq!(verdict, Verdict::Done);
    assert!(fx.lines.is_empty());
    assert!(!tracker.is_busy());
}

#[test]
fn test_schedule_read_stops_at_unset_entry() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_RC3X, 0x42, 0, 126, false).unwrap();

    let mut payload = Vec::new();
    payload.extend_from_slice(&[2, 39, 1]); // tuesday 06:30 on
    payload.extend_from_slice(&[2, 132, 0]); // tuesday 22:00 off
    payload.extend_from_slice(&[0x0E, 0x90, 7]); // unset

    let (verdict, fx) = tracker.handle_frame(&response(ADDR_RC3X, 0x42, 0, &payload));
    assert_eq!(verdict, Verdict::Done);
    assert_eq!(
        fx.lines,
        vec![
            "01 tuesday 06:30 on".to_string(),
            "02 tuesday 22:00 off".to_string(),
        ]
    );
}

#[test]
fn test_holiday_read_renders_range() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_RC3X, 0x42, 87, 6, false).unwrap();

    let (verdict, fx) =
        tracker.handle_frame(&response(ADDR_RC3X, 0x42, 87, &[23, 7, 1, 23, 7, 14]));
    assert_eq!(verdict, Verdict::Done);
    assert_eq!(
        fx.lines,
        vec!["begin 2023-07-01".to_string(), "end 2023-07-14".to_string()]
    );
}

#[test]
fn test_contact_info_concatenates_utf16_lines() {
    let mut tracker = RequestTracker::new();
    tracker.start_read(ADDR_UI800, MSG_UI_CONTACT_INFO, 0, 80, false).unwrap();

    let line = |text: &str| -> Vec<u8> {
        let mut units: Vec<u16> = text.encode_utf16().collect();
        units.resize(20, b' ' as u16);
        units.iter().flat_map(|u| u.to_be_bytes()).collect()
    };

    let first = line("Heating Co.");
    let second = line("+49 123 456");

    let (verdict, _) = tracker.handle_frame(&response(ADDR_UI800, MSG_UI_CONTACT_INFO, 0, &first));
    assert_eq!(verdict, Verdict::Pending);
    let (verdict, fx) =
        tracker.handle_frame(&response(ADDR_UI800, MSG_UI_CONTACT_INFO, 40, &second));
    assert_eq!(verdict, Verdict::Done);
    assert_eq!(
        fx.lines,
        vec!["Heating Co.".to_string(), "+49 123 456".to_string()]
    );
}
