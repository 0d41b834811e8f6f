//! # Point Catalog
//!
//! Static table of every logical point exposed by the WR3223. Each point has an
//! external channel id, an optional wire command, and read/write eligibility.
//!
//! Points without a command are never read or written directly; their values
//! come from decoding one of the composite words (status, relay, error, blockade).
//!
//! | Group | Source |
//! |-------|--------|
//! | Temperatures, speeds, parameters | own command (`T1`, `NZ`, `MD`, ...) |
//! | Malfunction, heat pump / heater status | status word `Ta` |
//! | Relay flags (compressor, bypass, ...) | relay word `RL` |
//! | Error flags | error word `ER` |
//! | EVU blockade | blockade word `Tf` |
//! | Ventilation level, on/off toggles | local setpoint, sent with keep-alive `SW` |

use crate::command::ProtocolCommand;

/// How a point's value is shaped at the publish boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Decimal number
    Number,
    /// On/off flag
    Switch,
}

/// Identifier of a logical point.
///
/// The discriminant is the index into [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointId {
    TemperatureEvaporator,
    TemperatureCondenser,
    TemperatureOutside,
    TemperatureOutgoingAir,
    TemperatureAfterHeatExchanger,
    TemperatureSupplyAir,
    TemperatureAfterBrinePreheating,
    TemperatureAfterPreheating,
    VentilationLevel,
    RotationSpeedSupplyAirMotor,
    RotationSpeedExhaustAirMotor,
    OperationMode,
    TemperatureSupplyAirTarget,
    HeatFeedbackRate,
    SpeedDeviationMaxLevel1,
    SpeedDeviationMaxLevel2,
    SpeedDeviationMaxLevel3,
    SpeedIncreaseEarthHeatExchangerLevel1,
    SpeedIncreaseEarthHeatExchangerLevel2,
    SpeedIncreaseEarthHeatExchangerLevel3,
    AirExchangeDecreaseOutsideTemperature,
    VentilationSpeedLevel1,
    VentilationSpeedLevel2,
    VentilationSpeedLevel3,
    SummerEarthHeatExchangerActivationTemperature,
    WinterEarthHeatExchangerActivationTemperature,
    DefrostingStartTemperature,
    DefrostingEndTemperature,
    DefrostingVentilationLevel,
    DefrostingHoldOffTime,
    DefrostingOvertravelTime,
    DefrostingHeatFeedbackRate,
    SolarMax,
    SolarUsage,
    DeltaTOff,
    DeltaTOn,
    TemperatureCondenserMax,
    IdleTimePressureReduction,
    SupportFanLevel1EarthHeatExchanger,
    SupportFanLevel2EarthHeatExchanger,
    SupportFanLevel3EarthHeatExchanger,
    ControlVoltageOutgoingAir,
    ControlVoltageSupplyAir,
    WarmWaterTargetTemperature,
    HeatPumpOpen,
    AdditionalHeaterOpen,
    // Local setpoints
    AdditionalHeaterActivate,
    HeatPumpActivate,
    CoolingMode,
    // Status word
    Malfunction,
    HeatPumpStatus,
    AdditionalHeaterStatus,
    // Blockade word
    EvuBlockade,
    // Relay word
    Compressor,
    AdditionalHeaterRelay,
    EarthHeatExchanger,
    Bypass,
    PreheatingRadiator,
    BypassRelay,
    ControlDeviceActive,
    HostInterfaceActive,
    VentilationLevelAvailable,
    WarmWaterPostHeater,
    MagnetValve,
    PreheatingRadiatorActive,
    // Error word
    ErrorTempSensorShort,
    ErrorOffset,
    ErrorTempSensorInterrupt,
    ErrorHighPressure,
    ErrorSysRam,
    ErrorSysRom,
    ErrorSysEe,
    ErrorSysIo,
    ErrorSys67Ad,
    ErrorSupplyAir,
    ErrorCondenser,
    ErrorOutgoingAir,
    ErrorPreheating,
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalPoint {
    pub id: PointId,
    /// External channel id (camelCase)
    pub channel: &'static str,
    pub command: Option<ProtocolCommand>,
    pub readable: bool,
    pub writable: bool,
    pub shape: ValueShape,
}

impl LogicalPoint {
    const fn read_only(id: PointId, channel: &'static str, command: ProtocolCommand) -> Self {
        Self {
            id,
            channel,
            command: Some(command),
            readable: true,
            writable: false,
            shape: ValueShape::Number,
        }
    }

    const fn read_write(id: PointId, channel: &'static str, command: ProtocolCommand) -> Self {
        Self {
            id,
            channel,
            command: Some(command),
            readable: true,
            writable: true,
            shape: ValueShape::Number,
        }
    }

    const fn derived(id: PointId, channel: &'static str) -> Self {
        Self {
            id,
            channel,
            command: None,
            readable: false,
            writable: false,
            shape: ValueShape::Switch,
        }
    }

    const fn switch(mut self) -> Self {
        self.shape = ValueShape::Switch;
        self
    }
}

use PointId as P;
use ProtocolCommand as C;

/// Every logical point, indexed by [`PointId`] discriminant.
pub static CATALOG: [LogicalPoint; 78] = [
    LogicalPoint::read_only(P::TemperatureEvaporator, "temperatureEvaporator", C::T1),
    LogicalPoint::read_only(P::TemperatureCondenser, "temperatureCondenser", C::T2),
    LogicalPoint::read_only(P::TemperatureOutside, "temperatureOutside", C::T3),
    LogicalPoint::read_only(P::TemperatureOutgoingAir, "temperatureOutgoingAir", C::T4),
    LogicalPoint::read_only(
        P::TemperatureAfterHeatExchanger,
        "temperatureAfterHeatExchanger",
        C::T5,
    ),
    LogicalPoint::read_only(P::TemperatureSupplyAir, "temperatureSupplyAir", C::T6),
    LogicalPoint::read_only(
        P::TemperatureAfterBrinePreheating,
        "temperatureAfterBrinePreheating",
        C::T7,
    ),
    LogicalPoint::read_only(
        P::TemperatureAfterPreheating,
        "temperatureAfterPreheating",
        C::T8,
    ),
    // Written through the keep-alive status word, not through LS
    LogicalPoint::read_only(P::VentilationLevel, "ventilationLevel", C::Ls),
    LogicalPoint::read_only(
        P::RotationSpeedSupplyAirMotor,
        "rotationSpeedSupplyAirMotor",
        C::Nz,
    ),
    LogicalPoint::read_only(
        P::RotationSpeedExhaustAirMotor,
        "rotationSpeedExhaustAirMotor",
        C::Na,
    ),
    LogicalPoint::read_write(P::OperationMode, "operationMode", C::Md),
    LogicalPoint::read_write(
        P::TemperatureSupplyAirTarget,
        "temperatureSupplyAirTarget",
        C::Sp,
    ),
    LogicalPoint::read_only(P::HeatFeedbackRate, "heatFeedbackRate", C::Ra),
    LogicalPoint::read_write(P::SpeedDeviationMaxLevel1, "speedDeviationMaxLevel1", C::D1),
    LogicalPoint::read_write(P::SpeedDeviationMaxLevel2, "speedDeviationMaxLevel2", C::D2),
    LogicalPoint::read_write(P::SpeedDeviationMaxLevel3, "speedDeviationMaxLevel3", C::D3),
    LogicalPoint::read_write(
        P::SpeedIncreaseEarthHeatExchangerLevel1,
        "speedIncreaseEarthHeatExchangerLevel1",
        C::E1,
    ),
    LogicalPoint::read_write(
        P::SpeedIncreaseEarthHeatExchangerLevel2,
        "speedIncreaseEarthHeatExchangerLevel2",
        C::E2,
    ),
    LogicalPoint::read_write(
        P::SpeedIncreaseEarthHeatExchangerLevel3,
        "speedIncreaseEarthHeatExchangerLevel3",
        C::E3,
    ),
    LogicalPoint::read_write(
        P::AirExchangeDecreaseOutsideTemperature,
        "airExchangeDecreaseOutsideTemperature",
        C::Lr,
    ),
    LogicalPoint::read_write(P::VentilationSpeedLevel1, "ventilationSpeedLevel1", C::L1),
    LogicalPoint::read_write(P::VentilationSpeedLevel2, "ventilationSpeedLevel2", C::L2),
    LogicalPoint::read_write(P::VentilationSpeedLevel3, "ventilationSpeedLevel3", C::L3),
    LogicalPoint::read_write(
        P::SummerEarthHeatExchangerActivationTemperature,
        "summerEarthHeatExchangerActivationTemperature",
        C::Es,
    ),
    LogicalPoint::read_write(
        P::WinterEarthHeatExchangerActivationTemperature,
        "winterEarthHeatExchangerActivationTemperature",
        C::Ew,
    ),
    LogicalPoint::read_write(
        P::DefrostingStartTemperature,
        "defrostingStartTemperature",
        C::Ae,
    ),
    LogicalPoint::read_write(P::DefrostingEndTemperature, "defrostingEndTemperature", C::Aa),
    LogicalPoint::read_write(
        P::DefrostingVentilationLevel,
        "defrostingVentilationLevel",
        C::Az,
    ),
    LogicalPoint::read_write(P::DefrostingHoldOffTime, "defrostingHoldOffTime", C::Ap),
    LogicalPoint::read_write(P::DefrostingOvertravelTime, "defrostingOvertravelTime", C::An),
    LogicalPoint::read_write(
        P::DefrostingHeatFeedbackRate,
        "defrostingHeatFeedbackRate",
        C::Ar,
    ),
    LogicalPoint::read_write(P::SolarMax, "solarMax", C::Sm),
    LogicalPoint::read_only(P::SolarUsage, "solarUsage", C::Sn),
    LogicalPoint::read_write(P::DeltaTOff, "deltaTOff", C::Da),
    LogicalPoint::read_write(P::DeltaTOn, "deltaTOn", C::De),
    LogicalPoint::read_write(P::TemperatureCondenserMax, "temperatureCondenserMax", C::Km),
    LogicalPoint::read_write(
        P::IdleTimePressureReduction,
        "idleTimePressureReduction",
        C::Pa,
    ),
    LogicalPoint::read_write(
        P::SupportFanLevel1EarthHeatExchanger,
        "supportFanLevel1EarthHeatExchanger",
        C::S1,
    ),
    LogicalPoint::read_write(
        P::SupportFanLevel2EarthHeatExchanger,
        "supportFanLevel2EarthHeatExchanger",
        C::S2,
    ),
    LogicalPoint::read_write(
        P::SupportFanLevel3EarthHeatExchanger,
        "supportFanLevel3EarthHeatExchanger",
        C::S3,
    ),
    LogicalPoint::read_only(
        P::ControlVoltageOutgoingAir,
        "controlVoltageOutgoingAir",
        C::Ua,
    ),
    LogicalPoint::read_only(P::ControlVoltageSupplyAir, "controlVoltageSupplyAir", C::Uz),
    LogicalPoint::read_write(
        P::WarmWaterTargetTemperature,
        "warmWaterTargetTemperature",
        C::Ws,
    ),
    LogicalPoint::read_write(P::HeatPumpOpen, "heatPumpOpen", C::Wp).switch(),
    LogicalPoint::read_write(P::AdditionalHeaterOpen, "additionalHeaterOpen", C::Zh).switch(),
    LogicalPoint::derived(P::AdditionalHeaterActivate, "additionalHeaterActivate"),
    LogicalPoint::derived(P::HeatPumpActivate, "heatPumpActivate"),
    LogicalPoint::derived(P::CoolingMode, "coolingMode"),
    LogicalPoint::derived(P::Malfunction, "malfunction"),
    LogicalPoint::derived(P::HeatPumpStatus, "heatPumpStatus"),
    LogicalPoint::derived(P::AdditionalHeaterStatus, "additionalHeaterStatus"),
    LogicalPoint::derived(P::EvuBlockade, "evuBlockade"),
    LogicalPoint::derived(P::Compressor, "compressor"),
    LogicalPoint::derived(P::AdditionalHeaterRelay, "additionalHeaterRelay"),
    LogicalPoint::derived(P::EarthHeatExchanger, "earthHeatExchanger"),
    LogicalPoint::derived(P::Bypass, "bypass"),
    LogicalPoint::derived(P::PreheatingRadiator, "preheatingRadiator"),
    LogicalPoint::derived(P::BypassRelay, "bypassRelay"),
    LogicalPoint::derived(P::ControlDeviceActive, "controlDeviceActive"),
    LogicalPoint::derived(P::HostInterfaceActive, "hostInterfaceActive"),
    LogicalPoint::derived(P::VentilationLevelAvailable, "ventilationLevelAvailable"),
    LogicalPoint::derived(P::WarmWaterPostHeater, "warmWaterPostHeater"),
    LogicalPoint::derived(P::MagnetValve, "magnetValve"),
    LogicalPoint::derived(P::PreheatingRadiatorActive, "preheatingRadiatorActive"),
    LogicalPoint::derived(P::ErrorTempSensorShort, "errorTempSensorShort"),
    LogicalPoint::derived(P::ErrorOffset, "errorOffset"),
    LogicalPoint::derived(P::ErrorTempSensorInterrupt, "errorTempSensorInterrupt"),
    LogicalPoint::derived(P::ErrorHighPressure, "errorHighPressure"),
    LogicalPoint::derived(P::ErrorSysRam, "errorSysRam"),
    LogicalPoint::derived(P::ErrorSysRom, "errorSysRom"),
    LogicalPoint::derived(P::ErrorSysEe, "errorSysEe"),
    LogicalPoint::derived(P::ErrorSysIo, "errorSysIo"),
    LogicalPoint::derived(P::ErrorSys67Ad, "errorSys67Ad"),
    LogicalPoint::derived(P::ErrorSupplyAir, "errorSupplyAir"),
    LogicalPoint::derived(P::ErrorCondenser, "errorCondenser"),
    LogicalPoint::derived(P::ErrorOutgoingAir, "errorOutgoingAir"),
    LogicalPoint::derived(P::ErrorPreheating, "errorPreheating"),
];

impl PointId {
    /// Catalog entry for this point.
    #[inline]
    pub fn info(self) -> &'static LogicalPoint {
        &CATALOG[self as usize]
    }

    /// External channel id.
    #[inline]
    pub fn channel(self) -> &'static str {
        self.info().channel
    }
}

/// Find a point by its external channel id.
pub fn lookup(channel: &str) -> Option<&'static LogicalPoint> {
    CATALOG.iter().find(|point| point.channel == channel)
}

/// Whether the dispatcher may queue a wire write for this point.
#[inline]
pub fn is_writable(id: PointId) -> bool {
    let point = id.info();
    point.writable && point.command.is_some()
}

/// Points polled in the generic read phase.
pub fn read_points() -> impl Iterator<Item = &'static LogicalPoint> {
    CATALOG
        .iter()
        .filter(|point| point.readable && point.command.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_indexed_by_point_id() {
        for (index, point) in CATALOG.iter().enumerate() {
            assert_eq!(point.id as usize, index, "{:?} out of place", point.id);
        }
    }

    #[test]
    fn test_channels_and_commands_unique() {
        let mut channels = HashSet::new();
        let mut commands = HashSet::new();
        for point in CATALOG.iter() {
            assert!(channels.insert(point.channel), "duplicate {}", point.channel);
            if let Some(cmd) = point.command {
                assert!(commands.insert(cmd), "duplicate command {}", cmd);
            }
        }
    }

    #[test]
    fn test_composite_words_are_not_catalog_commands() {
        for cmd in [
            ProtocolCommand::Ta,
            ProtocolCommand::Tf,
            ProtocolCommand::Sw,
            ProtocolCommand::Rl,
            ProtocolCommand::Er,
        ] {
            assert!(CATALOG.iter().all(|p| p.command != Some(cmd)));
        }
    }

    #[test]
    fn test_lookup() {
        let point = lookup("temperatureSupplyAirTarget").unwrap();
        assert_eq!(point.id, PointId::TemperatureSupplyAirTarget);
        assert_eq!(point.command, Some(ProtocolCommand::Sp));
        assert!(lookup("noSuchChannel").is_none());
    }

    #[test]
    fn test_derived_points_have_no_wire_access() {
        for id in [PointId::Bypass, PointId::HeatPumpStatus, PointId::ErrorSysIo] {
            let point = id.info();
            assert!(point.command.is_none());
            assert!(!is_writable(id));
            assert!(!point.readable);
        }
    }

    #[test]
    fn test_writability() {
        assert!(is_writable(PointId::OperationMode));
        assert!(is_writable(PointId::HeatPumpOpen));
        assert!(!is_writable(PointId::TemperatureOutside));
        assert!(!is_writable(PointId::SolarUsage));
        assert!(!is_writable(PointId::VentilationLevel));
    }

    #[test]
    fn test_read_points() {
        let reads: Vec<_> = read_points().map(|p| p.id).collect();
        assert_eq!(reads.len(), 46);
        assert_eq!(reads[0], PointId::TemperatureEvaporator);
        assert!(reads.contains(&PointId::VentilationLevel));
        assert!(reads.contains(&PointId::AdditionalHeaterOpen));
        assert!(!reads.contains(&PointId::Compressor));
    }
}
