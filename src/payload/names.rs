//! # Value Names and Formatting
//!
//! The stable English names for quantities and subsystems used on broker
//! topics and in command output, plus the text rendering of readings.
//! Enumerations format through per-quantity tables; everything else has a
//! fixed shape.

use crate::payload::records::DAY_NAMES;
use crate::payload::value::{EmsValue, Quantity, Reading, Subsystem};

/// Wire name of a quantity. Empty for quantities without an external name.
pub fn quantity_name(quantity: Quantity) -> &'static str {
    use Quantity::*;
    match quantity {
        TargetTemperature => "targettemperature",
        CurrentTemperature => "currenttemperature",
        SetTemperature => "settemperature",
        MinTemperature => "mintemperature",
        MaxTemperature => "maxtemperature",
        ManualTemperature => "manualtemperature",
        BoostTemperature => "boosttemperature",
        DayTemperature => "daytemperature",
        NightTemperature => "nighttemperature",
        VacationTemperature => "vacationtemperature",
        RoomTargetTemperature => "roomtargettemperature",
        RoomCurrentTemperature => "roomcurrenttemperature",
        MaxRoomEffect => "maxroomeffect",
        RoomOffset => "roomtemperatureoffset",
        DampedTemperature => "dampedtemperature",
        DisinfectionTemperature => "desinfectiontemperature",
        RoomTemperatureChange => "roomtemperaturechange",
        MixerControl => "mixercontrol",
        FlameCurrent => "flamecurrent",
        Pressure => "pressure",
        TargetModulation => "targetmodulation",
        CurrentModulation => "currentmodulation",
        MinModulation => "minmodulation",
        MaxModulation => "maxmodulation",
        RequestedPower => "requestedpower",
        OnHysteresis => "onhysteresis",
        OffHysteresis => "offhysteresis",
        SummerWinterThreshold => "summerwinterthreshold",
        FrostProtectTemperature => "frostprotecttemperature",
        DesignTemperature => "designtemperature",
        TemperatureOverride => "temperatureoverride",
        ReducedModeThreshold => "reducedmodethreshold",
        VacationReducedModeThreshold => "vacationreducedmodethreshold",
        CancelReducedModeThreshold => "cancelreducedmodethreshold",
        FlowRate => "flowrate",
        OperatingMinutes => "operatingminutes",
        OperatingMinutes2 => "operatingminutes2",
        HeatingMinutes => "heatingminutes",
        WarmWaterMinutes => "warmwaterminutes",
        HeaterStarts => "heaterstarts",
        WarmWaterPreparations => "warmwaterpreparations",
        DisinfectionHour => "desinfectionhour",
        MaintenanceInterval => "maintenanceintervalin100hours",
        OnOptimizationMinutes => "onoptimizationminutes",
        OffOptimizationMinutes => "offoptimizationminutes",
        AntiPendelMinutes => "antipendelminutes",
        FollowUpMinutes => "followupminutes",
        PartyHours => "partyhours",
        PauseHours => "pausehours",
        FlameActive => "flameactive",
        HeaterActive => "heateractive",
        IgnitionActive => "ignitionactive",
        PumpActive => "pumpactive",
        CirculationActive => "zirkpumpactive",
        ThreeWayValveOnWw => "3wayonww",
        OneTimeLoadActive => "onetimeload",
        DisinfectionActive => "desinfectionactive",
        BoostChargeActive => "boostcharge",
        WarmWaterPreparation => "warmwaterpreparationactive",
        WarmWaterTempOk => "warmwatertempok",
        DayMode => "daymode",
        SummerMode => "summermode",
        OffOptimization => "offoptimization",
        OnOptimization => "onoptimization",
        FloorDrying => "floordrying",
        WwOverride => "wwoverride",
        HolidayMode => "holidaymode",
        VacationMode => "vacationmode",
        PartyMode => "partymode",
        PauseMode => "pausemode",
        FrostProtectModeActive => "frostprotectmodeactive",
        SwitchPointActive => "switchpointactive",
        MasterSwitch => "masterswitch",
        CustomSchedule => "customschedule",
        Disinfection => "desinfection",
        OneTimeLoadIndicator => "onetimeloadindicator",
        OutdoorTempDamping => "outdoortempdamping",
        ScheduleOptimizer => "scheduleoptimizer",
        Sensor1Failure => "sensor1failure",
        Sensor2Failure => "sensor2failure",
        Failure => "failure",
        DisinfectionFailure => "desinfectionfailure",
        Loading => "loading",
        WwSystemType => "warmwatersystemtype",
        SwitchPoints => "switchpoints",
        MaintenanceReminder => "maintenancereminder",
        MaintenanceDue => "maintenancedue",
        OpMode => "opmode",
        DisinfectionDay => "desinfectionday",
        BuildingType => "buildingtype",
        ReductionMode => "reductionmode",
        HeatingSystem => "heatingsystem",
        RelevantParameter => "relevantparameter",
        FrostProtectMode => "frostprotectmode",
        VacationReductionMode => "vacationreductionmode",
        RemoteControlType => "remotecontroltype",
        HeatingCurve => "characteristic",
        Error => "error",
        SystemTime => "systemtime",
        MaintenanceDate => "maintenancedate",
        ServiceCode => "servicecode",
        ErrorCode => "errorcode",
        FaultCode => "faultcode",
        FaultNumber => "faultnumber",
    }
}

/// Wire name of a subsystem. Empty for [`Subsystem::None`].
pub fn subsystem_name(subsystem: Subsystem) -> &'static str {
    use Subsystem::*;
    match subsystem {
        None => "",
        Hk1 => "hk1",
        Hk2 => "hk2",
        Hk3 => "hk3",
        Hk4 => "hk4",
        Burner => "burner",
        Boiler => "heater",
        BoilerPump => "heaterpump",
        Rc => "rc",
        ReturnFlow => "returnflow",
        HeatExchanger => "heatexchanger",
        Ww => "ww",
        Circulation => "zirkpump",
        Outdoor => "outdoor",
        Exhaust => "exhaust",
        Intake => "intake",
        Solar => "solar",
        SolarPump => "solarpump",
        SolarTank => "solartank",
        SolarCollector => "solarcollector",
    }
}

const WW_SYSTEM: [(u8, &str); 5] = [
    (0, "none"),
    (1, "tankless"),
    (2, "small"),
    (3, "large"),
    (4, "speicherladesystem"),
];

const SWITCH_POINTS: [(u8, &str); 8] = [
    (0, "off"),
    (1, "1x"),
    (2, "2x"),
    (3, "3x"),
    (4, "4x"),
    (5, "5x"),
    (6, "6x"),
    (7, "alwayson"),
];

const MAINTENANCE_REMINDER: [(u8, &str); 3] = [(0, "off"), (1, "byhours"), (2, "bydate")];

const MAINTENANCE_DUE: [(u8, &str); 3] = [(0, "no"), (3, "byhours"), (8, "bydate")];

const OP_MODE: [(u8, &str); 3] = [(0, "off"), (1, "on"), (2, "auto")];

const HK_OP_MODE: [(u8, &str); 3] = [(0, "off"), (1, "manual"), (2, "auto")];

const WW_OP_MODE: [(u8, &str); 5] = [
    (0, "off"),
    (1, "eco"),
    (2, "comfort"),
    (3, "followheater"),
    (4, "auto"),
];

const ZIRK_OP_MODE: [(u8, &str); 4] = [(0, "off"), (1, "on"), (2, "followww"), (3, "auto")];

const BUILDING_TYPE: [(u8, &str); 3] = [(0, "light"), (1, "medium"), (2, "heavy")];

const HEATING_SYSTEM: [(u8, &str); 4] = [
    (0, "none"),
    (1, "heater"),
    (2, "convection"),
    (3, "floorheater"),
];

const REDUCTION_MODE: [(u8, &str); 4] = [
    (0, "offmode"),
    (1, "reduced"),
    (2, "raumhalt"),
    (3, "aussenhalt"),
];

const FROST_PROTECT: [(u8, &str); 3] = [(0, "off"), (1, "byoutdoortemp"), (2, "byindoortemp")];

const RELEVANT_PARAMETER: [(u8, &str); 2] = [(0, "outdoor"), (1, "indoor")];

const VACATION_REDUCTION: [(u8, &str); 2] = [(3, "outdoor"), (2, "indoor")];

const REMOTE_TYPE: [(u8, &str); 3] = [(0, "none"), (1, "rc20"), (2, "rc3x")];

/// Letter codes of the error log classes (message types 0x10..0x13).
fn error_class_letter(class: u16) -> &'static str {
    match class {
        0x10 => "L",
        0x11 => "B",
        0x12 => "S",
        0x13 => "D",
        _ => "?",
    }
}

fn lookup(table: &[(u8, &'static str)], value: u8) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == value).map(|(_, name)| *name)
}

fn enum_table(value: &EmsValue) -> Option<&'static [(u8, &'static str)]> {
    match value.quantity {
        Quantity::WwSystemType => Some(&WW_SYSTEM),
        Quantity::SwitchPoints => Some(&SWITCH_POINTS),
        Quantity::MaintenanceReminder => Some(&MAINTENANCE_REMINDER),
        Quantity::MaintenanceDue => Some(&MAINTENANCE_DUE),
        Quantity::OpMode => {
            if value.is_for_hk() {
                Some(&HK_OP_MODE)
            } else if value.subsystem == Subsystem::Ww {
                Some(&WW_OP_MODE)
            } else if value.subsystem == Subsystem::Circulation {
                Some(&ZIRK_OP_MODE)
            } else {
                Some(&OP_MODE)
            }
        }
        Quantity::DisinfectionDay => None, // handled via the weekday names
        Quantity::BuildingType => Some(&BUILDING_TYPE),
        Quantity::HeatingSystem => Some(&HEATING_SYSTEM),
        Quantity::ReductionMode => Some(&REDUCTION_MODE),
        Quantity::FrostProtectMode => Some(&FROST_PROTECT),
        Quantity::RelevantParameter => Some(&RELEVANT_PARAMETER),
        Quantity::VacationReductionMode => Some(&VACATION_REDUCTION),
        Quantity::RemoteControlType => Some(&REMOTE_TYPE),
        _ => None,
    }
}

fn format_enum(value: &EmsValue, raw: u8) -> String {
    if value.quantity == Quantity::DisinfectionDay {
        return match raw {
            0..=6 => DAY_NAMES[raw as usize].to_string(),
            7 => "everyday".to_string(),
            other => other.to_string(),
        };
    }
    match enum_table(value).and_then(|table| lookup(table, raw)) {
        Some(name) => name.to_string(),
        None => raw.to_string(),
    }
}

/// Renders a reading as the text put on broker topics and the command
/// socket.
pub fn format_value(value: &EmsValue) -> String {
    match &value.reading {
        Reading::Numeric(v) => {
            if value.valid {
                v.to_string()
            } else {
                "unavailable".to_string()
            }
        }
        Reading::Integer(v) => {
            if value.valid {
                v.to_string()
            } else {
                "unavailable".to_string()
            }
        }
        Reading::Boolean(v) => if *v { "on" } else { "off" }.to_string(),
        Reading::Enum(v) => format_enum(value, *v),
        Reading::HeatingCurve(points) => {
            format!("{}/{}/{}", points[0], points[1], points[2])
        }
        Reading::Error(entry) => {
            let body = if entry.record.is_empty() {
                "empty".to_string()
            } else {
                entry.record.to_string()
            };
            format!("{}{:02} {}", error_class_letter(entry.class), entry.index, body)
        }
        Reading::Date(record) => record.to_string(),
        Reading::SystemTime(record) => record.to_string(),
        Reading::Formatted(text) => text.clone(),
    }
}

/// One-line description of a value, used by the data debug sink and the
/// cache dump.
pub fn describe(value: &EmsValue) -> String {
    let subsystem = subsystem_name(value.subsystem);
    let quantity = quantity_name(value.quantity);
    if subsystem.is_empty() {
        format!("{} = {}", quantity, format_value(value))
    } else {
        format!("{} {} = {}", subsystem, quantity, format_value(value))
    }
}
