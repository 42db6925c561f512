//! # Typed Value Model
//!
//! Every decoded reading travels as an [`EmsValue`]: a quantity tag, the
//! subsystem it belongs to, the reading itself as a sum over the shapes the
//! bus knows, and a validity flag. Sensor sentinel encodings (all-ones,
//! sign-bit-only, and per-field invalid patterns) clear the validity flag
//! instead of producing fake numbers; consumers decide what to do with
//! invalid readings.

use crate::payload::records::{DateRecord, ErrorRecord, SystemTimeRecord};

/// What a value measures or reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    // numeric
    TargetTemperature,
    CurrentTemperature,
    SetTemperature,
    MinTemperature,
    MaxTemperature,
    ManualTemperature,
    BoostTemperature,
    DayTemperature,
    NightTemperature,
    VacationTemperature,
    RoomTargetTemperature,
    RoomCurrentTemperature,
    MaxRoomEffect,
    RoomOffset,
    DampedTemperature,
    DisinfectionTemperature,
    RoomTemperatureChange,
    MixerControl,
    FlameCurrent,
    Pressure,
    TargetModulation,
    CurrentModulation,
    MinModulation,
    MaxModulation,
    RequestedPower,
    OnHysteresis,
    OffHysteresis,
    SummerWinterThreshold,
    FrostProtectTemperature,
    DesignTemperature,
    TemperatureOverride,
    ReducedModeThreshold,
    VacationReducedModeThreshold,
    CancelReducedModeThreshold,
    FlowRate,
    // integer
    OperatingMinutes,
    OperatingMinutes2,
    HeatingMinutes,
    WarmWaterMinutes,
    HeaterStarts,
    WarmWaterPreparations,
    DisinfectionHour,
    MaintenanceInterval,
    OnOptimizationMinutes,
    OffOptimizationMinutes,
    AntiPendelMinutes,
    FollowUpMinutes,
    PartyHours,
    PauseHours,
    // boolean
    FlameActive,
    HeaterActive,
    IgnitionActive,
    PumpActive,
    CirculationActive,
    ThreeWayValveOnWw,
    OneTimeLoadActive,
    DisinfectionActive,
    BoostChargeActive,
    WarmWaterPreparation,
    WarmWaterTempOk,
    DayMode,
    SummerMode,
    OffOptimization,
    OnOptimization,
    FloorDrying,
    WwOverride,
    HolidayMode,
    VacationMode,
    PartyMode,
    PauseMode,
    FrostProtectModeActive,
    SwitchPointActive,
    MasterSwitch,
    CustomSchedule,
    Disinfection,
    OneTimeLoadIndicator,
    OutdoorTempDamping,
    ScheduleOptimizer,
    Sensor1Failure,
    Sensor2Failure,
    Failure,
    DisinfectionFailure,
    Loading,
    // enumeration
    WwSystemType,
    SwitchPoints,
    MaintenanceReminder,
    MaintenanceDue,
    OpMode,
    DisinfectionDay,
    BuildingType,
    ReductionMode,
    HeatingSystem,
    RelevantParameter,
    FrostProtectMode,
    VacationReductionMode,
    RemoteControlType,
    // structured
    HeatingCurve,
    Error,
    SystemTime,
    MaintenanceDate,
    // formatted
    ServiceCode,
    ErrorCode,
    FaultCode,
    FaultNumber,
}

/// Which part of the installation a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    None,
    Hk1,
    Hk2,
    Hk3,
    Hk4,
    Burner,
    Boiler,
    BoilerPump,
    Rc,
    ReturnFlow,
    HeatExchanger,
    Ww,
    Circulation,
    Outdoor,
    Exhaust,
    Intake,
    Solar,
    SolarPump,
    SolarTank,
    SolarCollector,
}

impl Subsystem {
    /// Subsystem for heating circuit `n` (1..=4).
    pub fn hk(n: usize) -> Subsystem {
        match n {
            1 => Subsystem::Hk1,
            2 => Subsystem::Hk2,
            3 => Subsystem::Hk3,
            _ => Subsystem::Hk4,
        }
    }
}

/// One entry of a peer's error log together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorEntry {
    /// Message type the entry came from; distinguishes the error classes.
    pub class: u16,
    /// Slot index within the log.
    pub index: u32,
    pub record: ErrorRecord,
}

/// The reading shapes a value can take.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Numeric(f64),
    Integer(u32),
    Boolean(bool),
    Enum(u8),
    HeatingCurve([u8; 3]),
    Error(ErrorEntry),
    Date(DateRecord),
    SystemTime(SystemTimeRecord),
    Formatted(String),
}

/// A decoded telemetry value with provenance and validity.
#[derive(Debug, Clone, PartialEq)]
pub struct EmsValue {
    pub quantity: Quantity,
    pub subsystem: Subsystem,
    pub reading: Reading,
    pub valid: bool,
}

impl EmsValue {
    /// Decodes a big-endian numeric field.
    ///
    /// Signed fields are two's complement within `8 * data.len()` bits; a
    /// raw value with only the sign bit set means "sensor unavailable".
    /// Unsigned fields are unavailable at the all-ones pattern. `invalids`
    /// lists additional per-field sentinel encodings. Divider 0 keeps the
    /// value as an integer count, everything else scales to a float.
    pub fn numeric(
        quantity: Quantity,
        subsystem: Subsystem,
        data: &[u8],
        divider: i32,
        signed: bool,
        invalids: &[&[u8]],
    ) -> EmsValue {
        let mut value: i64 = 0;
        for &byte in data {
            value = (value << 8) | byte as i64;
        }

        let mut valid = true;
        if signed {
            let sign_bit = 1i64 << (8 * data.len() - 1);
            if value & sign_bit != 0 {
                value &= !sign_bit;
                if value == 0 {
                    // only the sign bit set: sensor value unavailable
                    valid = false;
                }
                value -= sign_bit;
            }
        } else {
            let max = (1i64 << (8 * data.len())) - 1;
            valid = value != max;
        }

        if invalids.iter().any(|sentinel| *sentinel == data) {
            valid = false;
        }

        let reading = if divider == 0 {
            Reading::Integer(value.max(0) as u32)
        } else {
            Reading::Numeric(value as f64 / divider as f64)
        };

        EmsValue {
            quantity,
            subsystem,
            reading,
            valid,
        }
    }

    /// Extracts a single bit as a boolean reading.
    pub fn boolean(quantity: Quantity, subsystem: Subsystem, byte: u8, bit: u8) -> EmsValue {
        EmsValue {
            quantity,
            subsystem,
            reading: Reading::Boolean(byte & (1 << bit) != 0),
            valid: true,
        }
    }

    /// Wraps a single enumeration byte.
    pub fn enumeration(quantity: Quantity, subsystem: Subsystem, value: u8) -> EmsValue {
        EmsValue {
            quantity,
            subsystem,
            reading: Reading::Enum(value),
            valid: true,
        }
    }

    /// Wraps the three set points of a heating curve.
    pub fn curve(quantity: Quantity, subsystem: Subsystem, low: u8, medium: u8, high: u8) -> EmsValue {
        EmsValue {
            quantity,
            subsystem,
            reading: Reading::HeatingCurve([low, medium, high]),
            valid: true,
        }
    }

    pub fn error(quantity: Quantity, subsystem: Subsystem, entry: ErrorEntry) -> EmsValue {
        EmsValue {
            quantity,
            subsystem,
            reading: Reading::Error(entry),
            valid: true,
        }
    }

    pub fn date(quantity: Quantity, subsystem: Subsystem, record: DateRecord) -> EmsValue {
        EmsValue {
            quantity,
            subsystem,
            reading: Reading::Date(record),
            valid: true,
        }
    }

    pub fn system_time(quantity: Quantity, subsystem: Subsystem, record: SystemTimeRecord) -> EmsValue {
        EmsValue {
            quantity,
            subsystem,
            reading: Reading::SystemTime(record),
            valid: true,
        }
    }

    pub fn formatted(quantity: Quantity, subsystem: Subsystem, text: impl Into<String>) -> EmsValue {
        EmsValue {
            quantity,
            subsystem,
            reading: Reading::Formatted(text.into()),
            valid: true,
        }
    }

    /// Whether the value belongs to one of the four heating circuits.
    pub fn is_for_hk(&self) -> bool {
        matches!(
            self.subsystem,
            Subsystem::Hk1 | Subsystem::Hk2 | Subsystem::Hk3 | Subsystem::Hk4
        )
    }

    /// The raw byte of an enumeration reading.
    pub fn enum_value(&self) -> Option<u8> {
        match self.reading {
            Reading::Enum(v) => Some(v),
            _ => None,
        }
    }
}
