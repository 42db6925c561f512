//! # Collector Event Loop
//!
//! One task multiplexes everything: inbound frames from the transport, the
//! command channel fed by the TCP socket and the broker, and the timer set
//! (send pacing, response timeout, local write acknowledgement, test mode
//! refresh). Decoding and command translation run synchronously inside the
//! loop; the single-active-request rule and in-order dispatch keep the
//! state machines free of locking.

use crate::cache::ValueCache;
use crate::command::{parse_command, ClientRequest, CommandAction, CommandError};
use crate::config::Config;
use crate::constants::*;
use crate::ems::frame::{parse_frame, EmsFrame, TypeId};
use crate::ems::tracker::{RequestTracker, TimeoutAction, Verdict};
use crate::ems::{SendScheduler, Transport};
use crate::error::EmsError;
use crate::logging;
use crate::payload::decode::MessageDecoder;
use crate::payload::names::describe;
use crate::payload::value::EmsValue;
use log::debug;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Duration, Instant};

/// The collector: transport, protocol engine and client plumbing.
pub struct Collector {
    transport: Box<dyn Transport>,
    engine: Engine,
}

/// Protocol state shared by every event source.
struct Engine {
    decoder: MessageDecoder,
    cache: ValueCache,
    scheduler: SendScheduler,
    tracker: RequestTracker,
    values: broadcast::Sender<EmsValue>,
    /// Reply channel of the client owning the active request.
    reply: Option<mpsc::UnboundedSender<String>>,
    response_deadline: Option<Instant>,
    fake_ack_at: Option<Instant>,
    testmode_at: Option<Instant>,
    writable: bool,
}

impl Collector {
    pub fn new(
        transport: Box<dyn Transport>,
        config: &Config,
        values: broadcast::Sender<EmsValue>,
    ) -> Collector {
        let writable = transport.writable();
        Collector {
            transport,
            engine: Engine {
                decoder: MessageDecoder::new(config.rc_type),
                cache: ValueCache::new(),
                scheduler: SendScheduler::new(),
                tracker: RequestTracker::new(),
                values,
                reply: None,
                response_deadline: None,
                fake_ack_at: None,
                testmode_at: None,
                writable,
            },
        }
    }

    /// Runs until the transport fails or the command channel closes.
    /// Dropping the collector cancels every pending timer and dispatch;
    /// the command channel stays with the caller so a reopened transport
    /// serves the same clients.
    pub async fn run(
        self,
        commands: &mut mpsc::UnboundedReceiver<ClientRequest>,
    ) -> Result<(), EmsError> {
        let Collector {
            mut transport,
            mut engine,
        } = self;

        loop {
            // put everything on the wire whose peer gap has elapsed
            while let Some(out) = engine.scheduler.take_ready(Instant::now()) {
                transport.send(&out.frame).await?;
                debug!(target: logging::MESSAGE, "sent: {}", out.frame);
                engine.note_dispatched(&out.frame, out.tracked);
            }

            let wake = engine.next_wakeup(Instant::now());
            tokio::select! {
                frame = transport.recv() => engine.on_inbound(&frame?),
                request = commands.recv() => match request {
                    Some(request) => engine.on_command(request),
                    None => return Ok(()),
                },
                _ = sleep_until(wake.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600))),
                        if wake.is_some() => {
                    engine.on_timer(Instant::now());
                }
            }
        }
    }
}

impl Engine {
    fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        [
            self.scheduler.next_deadline(now),
            self.response_deadline,
            self.fake_ack_at,
            self.testmode_at,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Arms the response timer for a tracked frame that just hit the wire.
    /// Writes without the response bit get a local acknowledgement after a
    /// short delay instead.
    fn note_dispatched(&mut self, frame: &EmsFrame, tracked: bool) {
        if !tracked {
            return;
        }
        if frame.expects_response() {
            self.response_deadline = Some(Instant::now() + REQUEST_TIMEOUT);
            self.fake_ack_at = None;
        } else {
            self.fake_ack_at = Some(Instant::now() + FAKE_ACK_DELAY);
            self.response_deadline = None;
        }
    }

    fn on_inbound(&mut self, bytes: &[u8]) {
        let frame = match parse_frame(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(target: logging::IO, "IO: dropping inbound frame: {e}");
                return;
            }
        };
        debug!(target: logging::MESSAGE, "received: {frame}");

        let mut decoded = Vec::new();
        self.decoder.decode(&frame, &self.cache, &mut |value| decoded.push(value));
        for value in decoded {
            self.cache.update(&value);
            debug!(target: logging::DATA, "DATA: {}", describe(&value));
            let _ = self.values.send(value);
        }

        if (frame.dest | RESPONSE_EXPECTED) == ADDR_PC {
            self.scheduler.note_heard(frame.source, Instant::now());
            self.on_pc_frame(&frame);
        }
    }

    /// Feeds a frame addressed to us into the request tracker.
    fn on_pc_frame(&mut self, frame: &EmsFrame) {
        let (verdict, fx) = self.tracker.handle_frame(frame);
        if verdict != Verdict::NotMine {
            self.response_deadline = None;
            self.fake_ack_at = None;
        }

        for line in fx.lines {
            self.reply_line(&line);
        }
        if let Some(next) = fx.send {
            self.scheduler.submit(next, true);
        }

        match verdict {
            Verdict::Done => self.finish("OK"),
            Verdict::Failed => self.finish("FAIL"),
            Verdict::Pending | Verdict::NotMine => {}
        }
    }

    fn on_command(&mut self, request: ClientRequest) {
        if self.tracker.is_busy() {
            let _ = request.reply.send("ERRBUSY".to_string());
            return;
        }

        let action = match parse_command(&request.line, &self.cache) {
            Ok(action) => action,
            Err(CommandError::InvalidCmd) => {
                let _ = request.reply.send("ERRCMD".to_string());
                return;
            }
            Err(CommandError::InvalidArgs) => {
                let _ = request.reply.send("ERRARGS".to_string());
                return;
            }
        };

        match action {
            CommandAction::Reply(lines) => {
                for line in lines {
                    let _ = request.reply.send(line);
                }
                let _ = request.reply.send("OK".to_string());
            }
            CommandAction::Write(writes) => {
                if !self.writable {
                    let _ = request.reply.send("FAIL".to_string());
                    return;
                }
                let count = writes.len();
                for (i, w) in writes.into_iter().enumerate() {
                    if i + 1 == count {
                        let frame = self.tracker.start_write(w.dest, w.type_raw, w.offset, w.data);
                        self.scheduler.submit(frame, true);
                    } else {
                        self.scheduler
                            .submit(EmsFrame::write(w.dest, w.type_raw, w.offset, w.data), false);
                    }
                }
                self.reply = Some(request.reply);
            }
            CommandAction::Read { lines, read } => {
                if !self.writable {
                    let _ = request.reply.send("FAIL".to_string());
                    return;
                }
                for line in lines {
                    let _ = request.reply.send(line);
                }
                match self
                    .tracker
                    .start_read(read.dest, read.type_raw, read.offset, read.length, read.raw)
                {
                    Some(frame) => {
                        self.scheduler.submit(frame, true);
                        self.reply = Some(request.reply);
                    }
                    None => {
                        let _ = request.reply.send("OK".to_string());
                    }
                }
            }
            CommandAction::TestmodeOn => {
                if !self.writable {
                    let _ = request.reply.send("FAIL".to_string());
                    return;
                }
                self.scheduler.submit(testmode_frame(0x5A), false);
                // re-arming replaces any earlier timer, never duplicates it
                self.testmode_at = Some(Instant::now() + TESTMODE_INTERVAL);
                let _ = request.reply.send("OK".to_string());
            }
            CommandAction::TestmodeOff => {
                if !self.writable {
                    let _ = request.reply.send("FAIL".to_string());
                    return;
                }
                self.testmode_at = None;
                self.scheduler.submit(testmode_frame(0x00), false);
                let _ = request.reply.send("OK".to_string());
            }
        }
    }

    fn on_timer(&mut self, now: Instant) {
        if self.response_deadline.is_some_and(|d| d <= now) {
            self.response_deadline = None;
            match self.tracker.on_timeout() {
                TimeoutAction::Resend(frame) => self.scheduler.submit_front(frame, true),
                TimeoutAction::Fail => self.finish("ERRTIMEOUT"),
                TimeoutAction::Idle => {}
            }
        }

        if self.fake_ack_at.is_some_and(|d| d <= now) {
            self.fake_ack_at = None;
            // nobody answers plain writes; acknowledge locally
            let ack = EmsFrame {
                source: 0,
                dest: ADDR_PC & !RESPONSE_EXPECTED,
                type_id: TypeId::Classic(EMS_PLUS_TYPE),
                offset: 0x01,
                payload: Vec::new(),
            };
            self.on_pc_frame(&ack);
        }

        if self.testmode_at.is_some_and(|d| d <= now) {
            self.testmode_at = Some(now + TESTMODE_INTERVAL);
            self.scheduler.submit(testmode_frame(0x5A), false);
        }
    }

    fn reply_line(&self, line: &str) {
        if let Some(reply) = &self.reply {
            let _ = reply.send(line.to_string());
        }
    }

    fn finish(&mut self, verdict: &str) {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(verdict.to_string());
        }
    }
}

fn testmode_frame(value: u8) -> EmsFrame {
    EmsFrame::write(ADDR_UBA, MSG_UBA_TESTMODE, 0, vec![value])
}
