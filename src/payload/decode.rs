//! # Message Decode Tables
//!
//! Turns decoded frames into streams of typed values. A dispatch on
//! (source address, message type) selects a per-message parser; each parser
//! pulls its fields through offset-aware extractors, so a paginated
//! response that starts mid-message simply yields the fields that happen to
//! be inside the window.
//!
//! Messages from pairs not in the table decode to nothing and are reported
//! on the `data` debug sink.

use crate::cache::ValueCache;
use crate::config::RcType;
use crate::constants::*;
use crate::ems::frame::EmsFrame;
use crate::logging;
use crate::payload::records::{DateRecord, ErrorRecord, SystemTimeRecord, ERROR_RECORD_SIZE};
use crate::payload::value::{EmsValue, ErrorEntry, Quantity, Subsystem};
use log::debug;

/// The two sentinel encodings temperature sensors report besides the
/// sign-bit-only pattern.
pub const INVALID_TEMPERATURE_VALUES: [&[u8]; 2] = [&[0x7D, 0x00], &[0x83, 0x00]];

/// Offset-aware view of one message's payload window.
struct Fields<'a, 'b> {
    offset: usize,
    data: &'a [u8],
    out: &'b mut dyn FnMut(EmsValue),
}

impl Fields<'_, '_> {
    fn can_access(&self, offset: usize, size: usize) -> bool {
        offset >= self.offset && offset + size <= self.offset + self.data.len()
    }

    fn slice(&self, offset: usize, size: usize) -> &[u8] {
        &self.data[offset - self.offset..offset - self.offset + size]
    }

    fn byte(&self, offset: usize) -> u8 {
        self.data[offset - self.offset]
    }

    fn emit(&mut self, value: EmsValue) {
        (self.out)(value);
    }

    fn numeric(
        &mut self,
        offset: usize,
        size: usize,
        divider: i32,
        quantity: Quantity,
        subsystem: Subsystem,
    ) {
        self.numeric_full(offset, size, divider, quantity, subsystem, true, &[]);
    }

    fn numeric_unsigned(
        &mut self,
        offset: usize,
        size: usize,
        divider: i32,
        quantity: Quantity,
        subsystem: Subsystem,
    ) {
        self.numeric_full(offset, size, divider, quantity, subsystem, false, &[]);
    }

    fn numeric_full(
        &mut self,
        offset: usize,
        size: usize,
        divider: i32,
        quantity: Quantity,
        subsystem: Subsystem,
        signed: bool,
        invalids: &[&[u8]],
    ) {
        if self.can_access(offset, size) {
            let value =
                EmsValue::numeric(quantity, subsystem, self.slice(offset, size), divider, signed, invalids);
            self.emit(value);
        }
    }

    fn integer(&mut self, offset: usize, size: usize, quantity: Quantity, subsystem: Subsystem) {
        self.numeric_full(offset, size, 0, quantity, subsystem, false, &[]);
    }

    fn temperature(&mut self, offset: usize, quantity: Quantity, subsystem: Subsystem) {
        self.numeric_full(offset, 2, 10, quantity, subsystem, true, &INVALID_TEMPERATURE_VALUES);
    }

    fn boolean(&mut self, offset: usize, bit: u8, quantity: Quantity, subsystem: Subsystem) {
        if self.can_access(offset, 1) {
            let value = EmsValue::boolean(quantity, subsystem, self.byte(offset), bit);
            self.emit(value);
        }
    }

    fn enumeration(&mut self, offset: usize, quantity: Quantity, subsystem: Subsystem) {
        if self.can_access(offset, 1) {
            let value = EmsValue::enumeration(quantity, subsystem, self.byte(offset));
            self.emit(value);
        }
    }
}

/// Table-driven frame-to-values decoder.
#[derive(Debug, Clone, Copy)]
pub struct MessageDecoder {
    rc_type: RcType,
}

impl MessageDecoder {
    pub fn new(rc_type: RcType) -> MessageDecoder {
        MessageDecoder { rc_type }
    }

    /// Decodes one frame, pushing every extracted value through `out`.
    ///
    /// `cache` serves the one decode-time dependency: HK opmode messages
    /// move two temperature fields when the cached heating-system type says
    /// floor heating.
    pub fn decode(&self, frame: &EmsFrame, cache: &ValueCache, out: &mut dyn FnMut(EmsValue)) {
        if frame.source == 0 && frame.dest == 0 && frame.type_raw() == 0 {
            return;
        }

        let mut f = Fields {
            offset: frame.offset as usize,
            data: &frame.payload,
            out,
        };

        let handled = match (frame.source, frame.type_raw()) {
            (ADDR_UBA2, 0xD1) => {
                f.temperature(0, Quantity::CurrentTemperature, Subsystem::Outdoor);
                true
            }
            (ADDR_UBA2, 0xE4) => {
                uba2_monitor(&mut f);
                true
            }
            (ADDR_UBA2, 0xE5) => {
                uba2_monitor2(&mut f);
                true
            }
            (ADDR_UBA2, 0xE9) => {
                f.numeric(0, 1, 1, Quantity::TargetTemperature, Subsystem::Ww);
                f.temperature(1, Quantity::CurrentTemperature, Subsystem::Ww);
                true
            }
            // known warm water telemetry, contents not mapped yet
            (ADDR_UBA2, 0x2D) => true,
            (ADDR_UBA2, 0xBF) | (ADDR_UI800, 0xBF) => {
                fault_flags(&mut f);
                true
            }
            (ADDR_UI800, 0x06) | (ADDR_RC3X, 0x06) => {
                system_time(&mut f);
                true
            }
            (ADDR_UBA, 0x10) | (ADDR_UBA, 0x11) => {
                error_log(&mut f, frame.type_raw());
                true
            }
            (ADDR_UBA, 0x14) => {
                f.integer(0, 3, Quantity::OperatingMinutes, Subsystem::None);
                true
            }
            (ADDR_UBA, 0x15) => {
                uba_maintenance_settings(&mut f);
                true
            }
            (ADDR_UBA, 0x16) => {
                uba_parameters(&mut f);
                true
            }
            (ADDR_UBA, 0x18) => {
                uba_monitor_fast(&mut f);
                true
            }
            (ADDR_UBA, 0x19) => {
                uba_monitor_slow(&mut f);
                true
            }
            (ADDR_UBA, 0x1C) => {
                f.enumeration(5, Quantity::MaintenanceDue, Subsystem::Boiler);
                true
            }
            (ADDR_UBA, 0x33) => {
                uba_ww_parameters(&mut f);
                true
            }
            (ADDR_UBA, 0x34) => {
                uba_ww_monitor(&mut f);
                true
            }
            (ADDR_RC3X, 0x37) => {
                rc_ww_opmode(&mut f);
                true
            }
            (ADDR_RC3X, 0x3D) | (ADDR_RC3X, 0x47) | (ADDR_RC3X, 0x51) | (ADDR_RC3X, 0x5B) => {
                let hk = match frame.type_raw() {
                    0x3D => Subsystem::Hk1,
                    0x47 => Subsystem::Hk2,
                    0x51 => Subsystem::Hk3,
                    _ => Subsystem::Hk4,
                };
                self.rc_hk_opmode(&mut f, cache, hk);
                true
            }
            (ADDR_RC3X, 0x3E) | (ADDR_RC3X, 0x48) | (ADDR_RC3X, 0x52) | (ADDR_RC3X, 0x5C) => {
                let hk = match frame.type_raw() {
                    0x3E => Subsystem::Hk1,
                    0x48 => Subsystem::Hk2,
                    0x52 => Subsystem::Hk3,
                    _ => Subsystem::Hk4,
                };
                rc_hk_monitor(&mut f, hk);
                true
            }
            (ADDR_RC3X, 0x3F) | (ADDR_RC3X, 0x49) | (ADDR_RC3X, 0x53) | (ADDR_RC3X, 0x5D) => {
                let hk = match frame.type_raw() {
                    0x3F => Subsystem::Hk1,
                    0x49 => Subsystem::Hk2,
                    0x53 => Subsystem::Hk3,
                    _ => Subsystem::Hk4,
                };
                f.integer(85, 1, Quantity::PauseHours, hk);
                f.integer(86, 1, Quantity::PartyHours, hk);
                true
            }
            (ADDR_RC3X, 0xA3) => {
                f.numeric(0, 1, 1, Quantity::DampedTemperature, Subsystem::Outdoor);
                true
            }
            (ADDR_RC3X, 0xA5) => {
                f.numeric(5, 1, 1, Quantity::MinTemperature, Subsystem::Rc);
                f.enumeration(6, Quantity::BuildingType, Subsystem::Rc);
                f.boolean(21, 1, Quantity::OutdoorTempDamping, Subsystem::Rc);
                true
            }
            // commands the RC3x sends to other peers; nothing to extract
            (ADDR_RC3X, 0x1A) | (ADDR_RC3X, 0x35) | (ADDR_RC3X, 0x9D) | (ADDR_RC3X, 0xAC) => true,
            (src, 0xAE) if (ADDR_RC2X..=ADDR_RC2X_HK4).contains(&src) => {
                let hk = hk_from_rc2x(src);
                f.boolean(0, 7, Quantity::DayMode, hk);
                f.numeric(2, 1, 2, Quantity::RoomTargetTemperature, hk);
                f.temperature(3, Quantity::RoomCurrentTemperature, hk);
                true
            }
            (ADDR_WM10, 0x9C) => {
                f.temperature(0, Quantity::CurrentTemperature, Subsystem::Hk1);
                // byte 2 is 0 or 100, pump state lives in bit 2
                f.boolean(2, 2, Quantity::PumpActive, Subsystem::Hk1);
                true
            }
            (ADDR_WM10, 0x1E) => {
                f.temperature(0, Quantity::CurrentTemperature, Subsystem::Hk1);
                true
            }
            (src, 0xAB) if (ADDR_MM10_HK1..=ADDR_MM10_HK4).contains(&src) => {
                let hk = Subsystem::hk((src - ADDR_MM10_HK1) as usize + 1);
                f.numeric(0, 1, 1, Quantity::TargetTemperature, hk);
                f.temperature(1, Quantity::CurrentTemperature, hk);
                f.integer(3, 1, Quantity::MixerControl, hk);
                // byte 3 is 0 or 100, pump state lives in bit 2
                f.boolean(3, 2, Quantity::PumpActive, hk);
                true
            }
            (ADDR_SM10, 0x97) => {
                solar_monitor(&mut f);
                true
            }
            _ => false,
        };

        if !handled {
            debug!(
                target: logging::DATA,
                "DATA: unhandled message (source 0x{:02x}, type 0x{:04x})",
                frame.source,
                frame.type_raw()
            );
        }
    }

    fn rc_hk_opmode(&self, f: &mut Fields<'_, '_>, cache: &ValueCache, hk: Subsystem) {
        match self.rc_type {
            RcType::Rc30 => {
                if f.can_access(0, 1) {
                    let value = f.byte(0);
                    let (system, room_controlled) = if value == 4 || value == 5 {
                        (0, 1)
                    } else {
                        (value, 0)
                    };
                    f.emit(EmsValue::enumeration(Quantity::HeatingSystem, hk, system));
                    f.emit(EmsValue::enumeration(Quantity::RelevantParameter, hk, room_controlled));
                }
            }
            RcType::Rc35 => {
                f.enumeration(32, Quantity::HeatingSystem, hk);
                f.enumeration(33, Quantity::RelevantParameter, hk);
            }
        }

        let floor_heating = cache
            .get(Quantity::HeatingSystem, hk)
            .filter(|v| v.valid)
            .and_then(|v| v.enum_value())
            == Some(3);

        f.numeric(1, 1, 2, Quantity::NightTemperature, hk);
        f.numeric(2, 1, 2, Quantity::DayTemperature, hk);
        f.numeric(3, 1, 2, Quantity::VacationTemperature, hk);
        f.numeric(4, 1, 2, Quantity::MaxRoomEffect, hk);
        f.numeric(6, 1, 2, Quantity::RoomOffset, hk);
        f.enumeration(7, Quantity::OpMode, hk);
        f.boolean(8, 0, Quantity::FloorDrying, hk);
        if self.rc_type == RcType::Rc35 && floor_heating {
            f.numeric(35, 1, 1, Quantity::MaxTemperature, hk);
            f.numeric(36, 1, 1, Quantity::DesignTemperature, hk);
        } else {
            f.numeric(15, 1, 1, Quantity::MaxTemperature, hk);
            f.numeric(17, 1, 1, Quantity::DesignTemperature, hk);
        }
        f.numeric(16, 1, 1, Quantity::MinTemperature, hk);
        f.boolean(19, 1, Quantity::ScheduleOptimizer, hk);
        f.numeric(22, 1, 1, Quantity::SummerWinterThreshold, hk);
        f.numeric(23, 1, 1, Quantity::FrostProtectTemperature, hk);
        f.enumeration(25, Quantity::ReductionMode, hk);
        f.enumeration(26, Quantity::RemoteControlType, hk);
        f.enumeration(28, Quantity::FrostProtectMode, hk);
        f.numeric(37, 1, 2, Quantity::TemperatureOverride, hk);
        f.numeric(38, 1, 1, Quantity::CancelReducedModeThreshold, hk);
        f.numeric(39, 1, 1, Quantity::ReducedModeThreshold, hk);
        f.numeric(40, 1, 1, Quantity::VacationReducedModeThreshold, hk);
        f.enumeration(41, Quantity::VacationReductionMode, hk);
    }
}

fn hk_from_rc2x(source: u8) -> Subsystem {
    match source {
        ADDR_RC2X_HK2 => Subsystem::Hk2,
        ADDR_RC2X_HK3 => Subsystem::Hk3,
        ADDR_RC2X_HK4 => Subsystem::Hk4,
        _ => Subsystem::Hk1,
    }
}

fn uba2_monitor(f: &mut Fields<'_, '_>) {
    f.numeric(6, 1, 1, Quantity::TargetTemperature, Subsystem::Boiler);
    f.temperature(7, Quantity::CurrentTemperature, Subsystem::Boiler);
    f.temperature(13, Quantity::CurrentTemperature, Subsystem::HeatExchanger);
    f.temperature(17, Quantity::CurrentTemperature, Subsystem::ReturnFlow);
    f.numeric(19, 2, 10, Quantity::FlameCurrent, Subsystem::None);
    f.numeric_unsigned(21, 1, 10, Quantity::Pressure, Subsystem::None);
    f.integer(40, 1, Quantity::CurrentModulation, Subsystem::Burner);
    f.integer(41, 1, Quantity::TargetModulation, Subsystem::Burner);

    if f.can_access(4, 2) {
        let code = u16::from_be_bytes([f.byte(4), f.byte(5)]);
        f.emit(EmsValue::formatted(Quantity::ErrorCode, Subsystem::None, code.to_string()));
        f.emit(EmsValue::formatted(Quantity::ServiceCode, Subsystem::None, "--"));
    }

    if f.can_access(19, 2) {
        // flame current above zero means the flame is burning
        let active = u16::from_be_bytes([f.byte(19), f.byte(20)]) > 0;
        f.emit(EmsValue::boolean(Quantity::FlameActive, Subsystem::None, active as u8, 0));
    }
}

fn uba2_monitor2(f: &mut Fields<'_, '_>) {
    f.integer(25, 1, Quantity::CurrentModulation, Subsystem::BoilerPump);
    // byte 26 is 100 for WW, 50 mid-travel; bit 5 covers both
    f.boolean(26, 5, Quantity::ThreeWayValveOnWw, Subsystem::None);
    f.boolean(2, 7, Quantity::CirculationActive, Subsystem::None);
}

/// Three fault slots of code + number; "OK"/"0" when all are clear.
fn fault_flags(f: &mut Fields<'_, '_>) {
    let mut found = false;

    for i in 0..3 {
        let base = 5 + i * 7;
        if f.can_access(base, 3) {
            let code = f.slice(base, 3);
            if code.iter().any(|&b| b > 0) {
                let text: String = code.iter().map(|&b| b as char).collect();
                f.emit(EmsValue::formatted(Quantity::FaultCode, Subsystem::None, text));
                found = true;
            }
        }
        if f.can_access(base + 3, 2) {
            let number = u16::from_be_bytes([f.byte(base + 3), f.byte(base + 4)]);
            if number > 0 {
                f.emit(EmsValue::formatted(Quantity::FaultNumber, Subsystem::None, number.to_string()));
                found = true;
            }
        }
    }

    if !found {
        f.emit(EmsValue::formatted(Quantity::FaultCode, Subsystem::None, "OK"));
        f.emit(EmsValue::formatted(Quantity::FaultNumber, Subsystem::None, "0"));
    }
}

fn system_time(f: &mut Fields<'_, '_>) {
    if f.can_access(0, 8) {
        let record = SystemTimeRecord::decode(f.slice(0, 8));
        f.emit(EmsValue::system_time(Quantity::SystemTime, Subsystem::None, record));
    }
}

/// Error log records; a paginated window starting mid-record skips ahead
/// to the next record boundary.
fn error_log(f: &mut Fields<'_, '_>, class: u16) {
    let mut start = if f.offset % ERROR_RECORD_SIZE != 0 {
        (f.offset / ERROR_RECORD_SIZE + 1) * ERROR_RECORD_SIZE
    } else {
        f.offset
    };

    while f.can_access(start, ERROR_RECORD_SIZE) {
        let record = ErrorRecord::decode(f.slice(start, ERROR_RECORD_SIZE));
        let entry = ErrorEntry {
            class,
            index: (start / ERROR_RECORD_SIZE) as u32,
            record,
        };
        f.emit(EmsValue::error(Quantity::Error, Subsystem::None, entry));
        start += ERROR_RECORD_SIZE;
    }
}

fn uba_maintenance_settings(f: &mut Fields<'_, '_>) {
    f.enumeration(0, Quantity::MaintenanceReminder, Subsystem::Boiler);
    f.integer(1, 1, Quantity::MaintenanceInterval, Subsystem::Boiler);
    if f.can_access(2, 3) {
        let record = DateRecord::decode(f.slice(2, 3));
        f.emit(EmsValue::date(Quantity::MaintenanceDate, Subsystem::Boiler, record));
    }
}

fn uba_parameters(f: &mut Fields<'_, '_>) {
    f.boolean(0, 1, Quantity::MasterSwitch, Subsystem::Boiler);
    f.numeric(1, 1, 1, Quantity::SetTemperature, Subsystem::Boiler);
    f.integer(2, 1, Quantity::MaxModulation, Subsystem::Burner);
    f.integer(3, 1, Quantity::MinModulation, Subsystem::Burner);
    f.numeric(4, 1, 1, Quantity::OffHysteresis, Subsystem::Boiler);
    f.numeric(5, 1, 1, Quantity::OnHysteresis, Subsystem::Boiler);
    f.integer(6, 1, Quantity::AntiPendelMinutes, Subsystem::None);
    f.integer(8, 1, Quantity::FollowUpMinutes, Subsystem::BoilerPump);
    f.integer(9, 1, Quantity::MaxModulation, Subsystem::BoilerPump);
    f.integer(10, 1, Quantity::MinModulation, Subsystem::BoilerPump);
}

fn uba_monitor_fast(f: &mut Fields<'_, '_>) {
    f.numeric(0, 1, 1, Quantity::TargetTemperature, Subsystem::Boiler);
    f.temperature(1, Quantity::CurrentTemperature, Subsystem::Boiler);
    f.integer(3, 1, Quantity::TargetModulation, Subsystem::Burner);
    f.integer(4, 1, Quantity::CurrentModulation, Subsystem::Burner);
    f.boolean(7, 0, Quantity::FlameActive, Subsystem::None);
    f.boolean(7, 2, Quantity::HeaterActive, Subsystem::None);
    f.boolean(7, 3, Quantity::IgnitionActive, Subsystem::None);
    f.boolean(7, 5, Quantity::PumpActive, Subsystem::Boiler);
    f.boolean(7, 6, Quantity::ThreeWayValveOnWw, Subsystem::None);
    f.boolean(7, 7, Quantity::CirculationActive, Subsystem::None);
    f.temperature(13, Quantity::CurrentTemperature, Subsystem::ReturnFlow);
    f.numeric(15, 2, 10, Quantity::FlameCurrent, Subsystem::None);
    f.numeric_unsigned(17, 1, 10, Quantity::Pressure, Subsystem::None);
    f.temperature(25, Quantity::CurrentTemperature, Subsystem::Intake);

    if f.can_access(18, 2) {
        let code: String = f.slice(18, 2).iter().map(|&b| b as char).collect();
        f.emit(EmsValue::formatted(Quantity::ServiceCode, Subsystem::None, code));
    }
    if f.can_access(20, 2) {
        let code = u16::from_be_bytes([f.byte(20), f.byte(21)]);
        f.emit(EmsValue::formatted(Quantity::ErrorCode, Subsystem::None, code.to_string()));
    }
}

fn uba_monitor_slow(f: &mut Fields<'_, '_>) {
    f.temperature(0, Quantity::CurrentTemperature, Subsystem::Outdoor);
    f.temperature(2, Quantity::CurrentTemperature, Subsystem::HeatExchanger);
    f.temperature(4, Quantity::CurrentTemperature, Subsystem::Exhaust);
    f.integer(9, 1, Quantity::CurrentModulation, Subsystem::BoilerPump);
    f.integer(10, 3, Quantity::HeaterStarts, Subsystem::Boiler);
    f.integer(13, 3, Quantity::OperatingMinutes, Subsystem::Boiler);
    f.integer(16, 3, Quantity::OperatingMinutes2, Subsystem::Boiler);
    f.integer(19, 3, Quantity::HeatingMinutes, Subsystem::Boiler);
}

fn uba_ww_parameters(f: &mut Fields<'_, '_>) {
    f.boolean(1, 0, Quantity::MasterSwitch, Subsystem::Ww);
    f.numeric(2, 1, 1, Quantity::SetTemperature, Subsystem::Ww);
    f.enumeration(7, Quantity::SwitchPoints, Subsystem::Circulation);
    f.numeric(8, 1, 1, Quantity::DisinfectionTemperature, Subsystem::Ww);
}

fn uba_ww_monitor(f: &mut Fields<'_, '_>) {
    f.numeric(0, 1, 1, Quantity::TargetTemperature, Subsystem::Ww);
    f.temperature(1, Quantity::CurrentTemperature, Subsystem::Ww);
    f.boolean(5, 0, Quantity::DayMode, Subsystem::Ww);
    f.boolean(5, 1, Quantity::OneTimeLoadActive, Subsystem::Ww);
    f.boolean(5, 2, Quantity::DisinfectionActive, Subsystem::Ww);
    f.boolean(5, 3, Quantity::WarmWaterPreparation, Subsystem::None);
    f.boolean(5, 4, Quantity::BoostChargeActive, Subsystem::Ww);
    f.boolean(5, 5, Quantity::WarmWaterTempOk, Subsystem::None);
    f.boolean(6, 0, Quantity::Sensor1Failure, Subsystem::Ww);
    f.boolean(6, 1, Quantity::Sensor2Failure, Subsystem::Ww);
    f.boolean(6, 2, Quantity::Failure, Subsystem::Ww);
    f.boolean(6, 3, Quantity::DisinfectionFailure, Subsystem::Ww);
    f.boolean(7, 0, Quantity::DayMode, Subsystem::Circulation);
    f.boolean(7, 2, Quantity::CirculationActive, Subsystem::None);
    f.boolean(7, 3, Quantity::Loading, Subsystem::Ww);
    f.enumeration(8, Quantity::WwSystemType, Subsystem::None);
    f.numeric_unsigned(9, 1, 10, Quantity::FlowRate, Subsystem::Ww);
    f.integer(10, 3, Quantity::WarmWaterMinutes, Subsystem::None);
    f.integer(13, 3, Quantity::WarmWaterPreparations, Subsystem::None);
}

fn rc_ww_opmode(f: &mut Fields<'_, '_>) {
    f.boolean(0, 1, Quantity::CustomSchedule, Subsystem::Ww);
    f.boolean(1, 1, Quantity::CustomSchedule, Subsystem::Circulation);
    f.enumeration(2, Quantity::OpMode, Subsystem::Ww);
    f.enumeration(3, Quantity::OpMode, Subsystem::Circulation);
    f.boolean(4, 1, Quantity::Disinfection, Subsystem::Ww);
    f.enumeration(5, Quantity::DisinfectionDay, Subsystem::Ww);
    f.integer(6, 1, Quantity::DisinfectionHour, Subsystem::Ww);
    f.numeric(8, 1, 1, Quantity::MaxTemperature, Subsystem::Ww);
    f.boolean(9, 1, Quantity::OneTimeLoadIndicator, Subsystem::Ww);
}

fn rc_hk_monitor(f: &mut Fields<'_, '_>, hk: Subsystem) {
    f.boolean(0, 0, Quantity::OffOptimization, hk);
    f.boolean(0, 1, Quantity::OnOptimization, hk);
    f.boolean(0, 3, Quantity::WwOverride, hk);
    f.boolean(0, 4, Quantity::FloorDrying, hk);
    f.boolean(0, 6, Quantity::FrostProtectModeActive, hk);
    f.boolean(1, 0, Quantity::SummerMode, hk);
    f.boolean(1, 1, Quantity::DayMode, hk);

    if f.can_access(0, 2) {
        let automatic = f.byte(0) & (1 << 2) != 0;
        let day = f.byte(1) & (1 << 1) != 0;
        let mode = if automatic {
            2
        } else if day {
            1
        } else {
            0
        };
        f.emit(EmsValue::enumeration(Quantity::OpMode, hk, mode));
    }

    f.numeric(2, 1, 2, Quantity::RoomTargetTemperature, hk);
    f.temperature(3, Quantity::RoomCurrentTemperature, hk);
    f.integer(5, 1, Quantity::OnOptimizationMinutes, hk);
    f.integer(6, 1, Quantity::OffOptimizationMinutes, hk);

    if f.can_access(7, 3) {
        let value = EmsValue::curve(Quantity::HeatingCurve, hk, f.byte(7), f.byte(8), f.byte(9));
        f.emit(value);
    }

    if f.can_access(10, 1) && f.byte(10) & 1 == 0 {
        f.numeric(10, 2, 100, Quantity::RoomTemperatureChange, hk);
    }

    f.numeric(12, 1, 1, Quantity::RequestedPower, hk);
    f.boolean(13, 2, Quantity::PartyMode, hk);
    f.boolean(13, 3, Quantity::PauseMode, hk);
    f.boolean(13, 6, Quantity::VacationMode, hk);
    f.boolean(13, 7, Quantity::HolidayMode, hk);
    f.boolean(13, 4, Quantity::SwitchPointActive, hk);
    f.numeric(14, 1, 1, Quantity::TargetTemperature, hk);
}

fn solar_monitor(f: &mut Fields<'_, '_>) {
    f.temperature(2, Quantity::CurrentTemperature, Subsystem::SolarCollector);
    f.integer(4, 1, Quantity::CurrentModulation, Subsystem::SolarPump);
    f.temperature(5, Quantity::CurrentTemperature, Subsystem::SolarTank);
    f.boolean(7, 1, Quantity::PumpActive, Subsystem::Solar);
    f.integer(8, 3, Quantity::OperatingMinutes, Subsystem::Solar);
}
