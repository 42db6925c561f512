//! # Request Tracker
//!
//! Owns the single active request a collector instance may have in flight.
//! Issuing a read arms an accumulator; every matching inbound frame appends
//! its payload and either finishes the request, asks for the next page, or
//! chains a follow-up request. Timeouts resend the last frame until the
//! attempt budget runs out.
//!
//! Completion is three-valued: a frame can finish the request
//! (success/failure) or leave it pending; frames that don't belong to the
//! active request at all — typically late responses to a retried page —
//! are reported as not ours and ignored.

use crate::constants::*;
use crate::ems::frame::{EmsFrame, TypeId};
use crate::logging;
use crate::payload::records::{
    ErrorRecord, HolidayEntry, ScheduleEntry, ERROR_RECORD_SIZE, HOLIDAY_ENTRY_SIZE,
    SCHEDULE_ENTRY_SIZE,
};
use crate::util::hex::format_hex_prefixed;
use log::debug;

/// Devices asked in turn by the `getversion` chain.
const VERSION_CHAIN: [(u8, &str); 3] = [
    (ADDR_UBA2, "UBA2"),
    (ADDR_UI800, "UI800"),
    (ADDR_RH800, "RH800"),
];

/// How an inbound frame relates to the active request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Frame does not belong to the active request.
    NotMine,
    /// Frame consumed, request still in flight.
    Pending,
    /// Request completed successfully.
    Done,
    /// Request rejected or not renderable.
    Failed,
}

/// What to do when the response timer fires.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeoutAction {
    /// No request in flight, nothing to do.
    Idle,
    /// Resend the given frame and keep waiting.
    Resend(EmsFrame),
    /// Attempt budget exhausted, fail the command.
    Fail,
}

/// Output lines and follow-up frames produced while handling a frame.
#[derive(Debug, Default)]
pub struct TrackerEffects {
    pub lines: Vec<String>,
    pub send: Option<EmsFrame>,
}

#[derive(Debug)]
struct ActiveRequest {
    dest: u8,
    type_raw: u16,
    offset: usize,
    length: usize,
    response: Vec<u8>,
    raw: bool,
    write: bool,
    parse_position: usize,
    response_counter: u32,
}

/// Active-request state machine.
#[derive(Debug, Default)]
pub struct RequestTracker {
    active: Option<ActiveRequest>,
    retries_left: u8,
    last_sent: Option<EmsFrame>,
}

impl RequestTracker {
    pub fn new() -> RequestTracker {
        RequestTracker::default()
    }

    /// Whether a request is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Drops the active request without completing it.
    pub fn abort(&mut self) {
        self.active = None;
        self.last_sent = None;
    }

    /// Starts a read of `length` bytes at `offset`, returning the first
    /// page frame to send. In raw mode the accumulated bytes are rendered
    /// as hex instead of going through a response handler.
    pub fn start_read(
        &mut self,
        dest: u8,
        type_raw: u16,
        offset: u8,
        length: usize,
        raw: bool,
    ) -> Option<EmsFrame> {
        debug!(
            target: logging::MESSAGE,
            "start request: dest=0x{dest:02x} type=0x{type_raw:04x} offset={offset} length={length}"
        );
        self.active = Some(ActiveRequest {
            dest,
            type_raw,
            offset: offset as usize,
            length,
            response: Vec::with_capacity(length),
            raw,
            write: false,
            parse_position: 0,
            response_counter: 0,
        });
        self.continue_request()
    }

    /// Registers a write as the active request and returns its frame. The
    /// request completes on the 0xFF acknowledgement (bus or synthetic).
    pub fn start_write(&mut self, dest: u8, type_raw: u16, offset: u8, data: Vec<u8>) -> EmsFrame {
        debug!(
            target: logging::MESSAGE,
            "write command: dest=0x{dest:02x} type=0x{type_raw:04x} offset={offset} data={}",
            format_hex_prefixed(&data)
        );
        let frame = EmsFrame::write(dest, type_raw, offset, data);
        self.active = Some(ActiveRequest {
            dest,
            type_raw,
            offset: offset as usize,
            length: 0,
            response: Vec::new(),
            raw: false,
            write: true,
            parse_position: 0,
            response_counter: 0,
        });
        self.retries_left = MAX_REQUEST_ATTEMPTS;
        self.last_sent = Some(frame.clone());
        frame
    }

    /// Offers an inbound frame to the active request.
    pub fn handle_frame(&mut self, frame: &EmsFrame) -> (Verdict, TrackerEffects) {
        let mut fx = TrackerEffects::default();

        if self.active.is_none() {
            return (Verdict::NotMine, fx);
        }

        // 0xFF is the device acknowledgement; offset 0x04 signals rejection
        if frame.type_id == TypeId::Classic(EMS_PLUS_TYPE) {
            self.abort();
            let verdict = if frame.offset == 0x04 {
                Verdict::Failed
            } else {
                Verdict::Done
            };
            return (verdict, fx);
        }

        let raw = {
            let Some(active) = self.active.as_mut() else {
                return (Verdict::NotMine, fx);
            };
            if active.write
                || frame.source != active.dest
                || frame.type_raw() != active.type_raw
                || frame.offset as usize != active.offset + active.response.len()
            {
                // likely a response to a request we already retried, ignore it
                return (Verdict::NotMine, fx);
            }

            if frame.payload.is_empty() {
                // no more data is available
                active.length = active.response.len();
            } else {
                active.response.extend_from_slice(&frame.payload);
            }
            active.raw
        };

        let verdict = if raw {
            match self.continue_request() {
                Some(next) => {
                    fx.send = Some(next);
                    Verdict::Pending
                }
                None => {
                    if let Some(active) = self.active.as_ref() {
                        fx.lines.push(format_hex_prefixed(&active.response));
                    }
                    Verdict::Done
                }
            }
        } else {
            self.handle_response(&mut fx)
        };

        if matches!(verdict, Verdict::Done | Verdict::Failed) {
            self.abort();
        }
        (verdict, fx)
    }

    /// Handles an expired response timer.
    pub fn on_timeout(&mut self) -> TimeoutAction {
        if self.active.is_none() {
            return TimeoutAction::Idle;
        }
        self.retries_left = self.retries_left.saturating_sub(1);
        if self.retries_left == 0 {
            self.abort();
            return TimeoutAction::Fail;
        }
        match &self.last_sent {
            Some(frame) => TimeoutAction::Resend(frame.clone()),
            None => {
                self.abort();
                TimeoutAction::Fail
            }
        }
    }

    /// Emits the next page request of the active read, or nothing when all
    /// requested bytes arrived.
    fn continue_request(&mut self) -> Option<EmsFrame> {
        let active = self.active.as_ref()?;
        let already = active.response.len();
        if already >= active.length {
            return None;
        }

        let offset = (active.offset + already) as u8;
        let remaining = (active.length - already).min(255) as u8;
        let frame = EmsFrame::read_request(active.dest, active.type_raw, offset, remaining);
        self.retries_left = MAX_REQUEST_ATTEMPTS;
        self.last_sent = Some(frame.clone());
        Some(frame)
    }

    fn handle_response(&mut self, fx: &mut TrackerEffects) -> Verdict {
        let Some(active) = self.active.as_ref() else {
            return Verdict::Failed;
        };
        let (type_raw, request_offset) = (active.type_raw, active.offset);

        match type_raw {
            MSG_VERSION => self.version_response(fx),
            0x10 | 0x11 | MSG_RC_ERROR_LOG => self.error_log_response(fx),
            MSG_UI_CONTACT_INFO => self.contact_info_response(fx),
            t if MSG_HK_SCHEDULE.contains(&t) => {
                if request_offset >= HOLIDAY_RANGE_OFFSET as usize {
                    self.holiday_response(fx)
                } else {
                    self.schedule_response(fx)
                }
            }
            _ => Verdict::Failed, // no renderer for this response type
        }
    }

    /// Formats one peer's version and chains the read to the next device.
    fn version_response(&mut self, fx: &mut TrackerEffects) -> Verdict {
        let Some(active) = self.active.as_ref() else {
            return Verdict::Failed;
        };
        if active.response.len() < 3 {
            return self.push_continuation(fx);
        }
        let (dest, major, minor) = (active.dest, active.response[1], active.response[2]);

        let Some(pos) = VERSION_CHAIN.iter().position(|&(addr, _)| addr == dest) else {
            return Verdict::Failed;
        };
        fx.lines
            .push(format!("{} version: {}.{:02}", VERSION_CHAIN[pos].1, major, minor));

        if pos + 1 >= VERSION_CHAIN.len() {
            return Verdict::Done;
        }
        let (next, _) = VERSION_CHAIN[pos + 1];
        match self.start_read(next, MSG_VERSION, 0, 3, false) {
            Some(frame) => {
                fx.send = Some(frame);
                Verdict::Pending
            }
            None => Verdict::Done,
        }
    }

    /// One line per populated error log slot; an empty slot ends the log.
    fn error_log_response(&mut self, fx: &mut TrackerEffects) -> Verdict {
        loop {
            let Some(active) = self.active.as_mut() else {
                return Verdict::Failed;
            };
            if active.parse_position + ERROR_RECORD_SIZE > active.response.len() {
                break;
            }
            let record = ErrorRecord::decode(
                &active.response[active.parse_position..active.parse_position + ERROR_RECORD_SIZE],
            );
            active.parse_position += ERROR_RECORD_SIZE;
            active.response_counter += 1;
            if record.is_empty() {
                return Verdict::Done;
            }
            fx.lines
                .push(format!("{:02} {}", active.response_counter, record));
        }
        self.push_continuation_or_done(fx)
    }

    /// One line per programmed switch point; a cleared slot ends the
    /// program.
    fn schedule_response(&mut self, fx: &mut TrackerEffects) -> Verdict {
        loop {
            let Some(active) = self.active.as_mut() else {
                return Verdict::Failed;
            };
            if active.parse_position + SCHEDULE_ENTRY_SIZE > active.response.len() {
                break;
            }
            let entry = ScheduleEntry::decode(
                &active.response
                    [active.parse_position..active.parse_position + SCHEDULE_ENTRY_SIZE],
            );
            active.parse_position += SCHEDULE_ENTRY_SIZE;
            active.response_counter += 1;
            if entry.is_unset() {
                return Verdict::Done;
            }
            fx.lines
                .push(format!("{:02} {}", active.response_counter, entry));
        }
        self.push_continuation_or_done(fx)
    }

    /// Renders the begin/end dates of a holiday range.
    fn holiday_response(&mut self, fx: &mut TrackerEffects) -> Verdict {
        let Some(active) = self.active.as_ref() else {
            return Verdict::Failed;
        };
        if active.response.len() < 2 * HOLIDAY_ENTRY_SIZE {
            return self.push_continuation(fx);
        }
        let begin = HolidayEntry::decode(&active.response[0..HOLIDAY_ENTRY_SIZE]);
        let end = HolidayEntry::decode(&active.response[HOLIDAY_ENTRY_SIZE..2 * HOLIDAY_ENTRY_SIZE]);
        fx.lines.push(format!("begin {begin}"));
        fx.lines.push(format!("end {end}"));
        Verdict::Done
    }

    /// Concatenates and UTF-16BE-decodes the 40-byte contact info lines.
    fn contact_info_response(&mut self, fx: &mut TrackerEffects) -> Verdict {
        if let Some(frame) = self.continue_request() {
            fx.send = Some(frame);
            return Verdict::Pending;
        }
        let Some(active) = self.active.as_ref() else {
            return Verdict::Failed;
        };
        for block in active.response.chunks(40) {
            let units: Vec<u16> = block
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            let line = String::from_utf16_lossy(&units).trim_end().to_string();
            fx.lines.push(line);
        }
        Verdict::Done
    }

    fn push_continuation(&mut self, fx: &mut TrackerEffects) -> Verdict {
        match self.continue_request() {
            Some(frame) => {
                fx.send = Some(frame);
                Verdict::Pending
            }
            None => Verdict::Failed, // response shorter than renderable
        }
    }

    fn push_continuation_or_done(&mut self, fx: &mut TrackerEffects) -> Verdict {
        match self.continue_request() {
            Some(frame) => {
                fx.send = Some(frame);
                Verdict::Pending
            }
            None => Verdict::Done,
        }
    }
}
