//! # WR3223 Value Codec
//!
//! Decoding of the composite words the controller packs into decimal strings,
//! and encoding of the keep-alive status word.
//!
//! ## Wire values
//!
//! Every value arrives as decimal text, sometimes with a fractional part
//! (`"77"`, `"77.0"`, `" -48."`). Decoders trim the text, cut it at the first
//! `.` and parse the integer part. Anything else is a
//! [`Wr3223Error::MalformedValue`].
//!
//! ## Composite words
//!
//! | Command | Word | Sign | Flags |
//! |---------|------|------|-------|
//! | `Ta` | status | inverted | bits 4-6 |
//! | `RL` | relay | as sent | 12 single-bit flags |
//! | `ER` | error | as sent | 13 submasks |
//! | `Tf` | EVU blockade | inverted | bit 0 |
//! | `SW` | keep-alive (write) | - | bits 0-5 |

use tracing::debug;

use crate::constants::*;
use crate::error::{Wr3223Error, Wr3223Result};

/// Value codec for the WR3223 composite words.
pub struct Wr3223Codec;

#[inline]
fn has_mask(value: i64, mask: i64) -> bool {
    value & mask == mask
}

/// Parse the integer part of a wire value.
///
/// # Example
///
/// ```rust
/// use wr3223::codec::parse_integer;
///
/// assert_eq!(parse_integer(" 21.5").unwrap(), 21);
/// assert_eq!(parse_integer("-48.").unwrap(), -48);
/// assert!(parse_integer("abc").is_err());
/// ```
pub fn parse_integer(raw: &str) -> Wr3223Result<i64> {
    let trimmed = raw.trim();
    let integer_part = match trimmed.find('.') {
        Some(pos) => &trimmed[..pos],
        None => trimmed,
    };
    integer_part
        .trim()
        .parse::<i64>()
        .map_err(|e| Wr3223Error::malformed(raw, e.to_string()))
}

// ============================================================================
// Status Word
// ============================================================================

/// State reported by the status word (`Ta`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub malfunction: bool,
    pub heat_pump_on: bool,
    pub additional_heater_on: bool,
}

/// Requested state sent with every keep-alive (`SW`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetpointRequest {
    pub heat_pump_on: bool,
    /// 0 = off, 1-3
    pub ventilation_level: u8,
    pub additional_heater_on: bool,
    pub cooling_on: bool,
}

impl Default for SetpointRequest {
    fn default() -> Self {
        Self {
            heat_pump_on: false,
            ventilation_level: 2,
            additional_heater_on: false,
            cooling_on: false,
        }
    }
}

/// Decode the status word. The controller sends it negated.
pub fn decode_status(raw: &str) -> Wr3223Result<StatusFlags> {
    let value = parse_integer(raw)?.wrapping_neg() & STATUS_MASK;
    debug!("Status word {:?} -> {:#09b}", raw, value);
    Ok(StatusFlags {
        malfunction: has_mask(value, STATUS_MALFUNCTION),
        heat_pump_on: has_mask(value, STATUS_HEAT_PUMP),
        additional_heater_on: has_mask(value, STATUS_ADDITIONAL_HEATER),
    })
}

/// Encode the keep-alive status word.
///
/// Ventilation level is a two-bit pair over bits 1-2 (0→00, 1→11, 2→10, 3→01)
/// with bit 4 forcing level 0.
///
/// ```rust
/// use wr3223::codec::{encode_status, SetpointRequest};
///
/// let request = SetpointRequest::default();
/// assert_eq!(encode_status(&request), "43");
/// ```
pub fn encode_status(request: &SetpointRequest) -> String {
    let level = request.ventilation_level;
    let mut data = 0;
    if !request.heat_pump_on {
        data |= SW_HEAT_PUMP_OFF;
    }
    if level == 1 || level == 2 {
        data |= SW_LEVEL_BIT_A;
    }
    if level == 1 || level == 3 {
        data |= SW_LEVEL_BIT_B;
    }
    if !request.additional_heater_on {
        data |= SW_ADDITIONAL_HEATER_OFF;
    }
    if level == 0 {
        data |= SW_LEVEL_OFF;
    }
    if !request.cooling_on {
        data |= SW_COOLING_OFF;
    }
    data.to_string()
}

// ============================================================================
// Relay Word
// ============================================================================

/// Relay word (`RL`) flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayFlags {
    pub compressor: bool,
    pub additional_heater: bool,
    pub earth_heat_exchanger: bool,
    pub bypass: bool,
    pub preheating_radiator: bool,
    pub bypass_relay: bool,
    /// A physical control panel holds write authority
    pub control_device_active: bool,
    pub host_interface_active: bool,
    pub ventilation_level_available: bool,
    pub warm_water_post_heater: bool,
    pub magnet_valve: bool,
    pub pre_heater_radiator_active: bool,
}

/// Decode the relay word.
pub fn decode_relay(raw: &str) -> Wr3223Result<RelayFlags> {
    let value = parse_integer(raw)?;
    debug!("Relay word {:?} -> {}", raw, value);
    Ok(RelayFlags {
        compressor: has_mask(value, RELAY_COMPRESSOR),
        additional_heater: has_mask(value, RELAY_ADDITIONAL_HEATER),
        earth_heat_exchanger: has_mask(value, RELAY_EARTH_HEAT_EXCHANGER),
        bypass: has_mask(value, RELAY_BYPASS),
        preheating_radiator: has_mask(value, RELAY_PREHEATING_RADIATOR),
        bypass_relay: has_mask(value, RELAY_BYPASS_RELAY),
        control_device_active: has_mask(value, RELAY_CONTROL_DEVICE_ACTIVE),
        host_interface_active: has_mask(value, RELAY_HOST_INTERFACE_ACTIVE),
        ventilation_level_available: has_mask(value, RELAY_VENTILATION_LEVEL_AVAILABLE),
        warm_water_post_heater: has_mask(value, RELAY_WARM_WATER_POST_HEATER),
        magnet_valve: has_mask(value, RELAY_MAGNET_VALVE),
        pre_heater_radiator_active: has_mask(value, RELAY_PRE_HEATER_RADIATOR_ACTIVE),
    })
}

// ============================================================================
// Error Word
// ============================================================================

/// Error word (`ER`) flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorFlags {
    pub temp_sensor_short: bool,
    pub offset: bool,
    pub temp_sensor_interrupt: bool,
    pub high_pressure: bool,
    pub sys_ram: bool,
    pub sys_rom: bool,
    pub sys_ee: bool,
    pub sys_io: bool,
    pub sys_67_ad: bool,
    pub supply_air: bool,
    pub condenser: bool,
    pub outgoing_air: bool,
    pub preheating: bool,
}

impl ErrorFlags {
    /// True when any error flag is set.
    pub fn any(&self) -> bool {
        [
            self.temp_sensor_short,
            self.offset,
            self.temp_sensor_interrupt,
            self.high_pressure,
            self.sys_ram,
            self.sys_rom,
            self.sys_ee,
            self.sys_io,
            self.sys_67_ad,
            self.supply_air,
            self.condenser,
            self.outgoing_air,
            self.preheating,
        ]
        .iter()
        .any(|&flag| flag)
    }
}

/// Decode the error word. Each mask is an independent submask test.
pub fn decode_errors(raw: &str) -> Wr3223Result<ErrorFlags> {
    let value = parse_integer(raw)?;
    debug!("Error word {:?} -> {}", raw, value);
    Ok(ErrorFlags {
        temp_sensor_short: has_mask(value, ERROR_TEMP_SENSOR_SHORT),
        offset: has_mask(value, ERROR_OFFSET),
        temp_sensor_interrupt: has_mask(value, ERROR_TEMP_SENSOR_INTERRUPT),
        high_pressure: has_mask(value, ERROR_HIGH_PRESSURE),
        sys_ram: has_mask(value, ERROR_SYS_RAM),
        sys_rom: has_mask(value, ERROR_SYS_ROM),
        sys_ee: has_mask(value, ERROR_SYS_EE),
        sys_io: has_mask(value, ERROR_SYS_IO),
        sys_67_ad: has_mask(value, ERROR_SYS_67_AD),
        supply_air: has_mask(value, ERROR_SUPPLY_AIR),
        condenser: has_mask(value, ERROR_CONDENSER),
        outgoing_air: has_mask(value, ERROR_OUTGOING_AIR),
        preheating: has_mask(value, ERROR_PREHEATING),
    })
}

// ============================================================================
// Blockade Word
// ============================================================================

/// Decode the EVU blockade word. The controller sends it negated.
pub fn decode_blockade(raw: &str) -> Wr3223Result<bool> {
    let value = parse_integer(raw)?.wrapping_neg();
    debug!("Blockade word {:?} -> {}", raw, value);
    Ok(has_mask(value, BLOCKADE_FLAG))
}

impl Wr3223Codec {
    /// Decode the status word (`Ta`).
    #[inline]
    pub fn status(raw: &str) -> Wr3223Result<StatusFlags> {
        decode_status(raw)
    }

    /// Decode the relay word (`RL`).
    #[inline]
    pub fn relay(raw: &str) -> Wr3223Result<RelayFlags> {
        decode_relay(raw)
    }

    /// Decode the error word (`ER`).
    #[inline]
    pub fn errors(raw: &str) -> Wr3223Result<ErrorFlags> {
        decode_errors(raw)
    }

    /// Decode the EVU blockade word (`Tf`).
    #[inline]
    pub fn blockade(raw: &str) -> Wr3223Result<bool> {
        decode_blockade(raw)
    }

    /// Encode the keep-alive word (`SW`).
    #[inline]
    pub fn keep_alive(request: &SetpointRequest) -> String {
        encode_status(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_integer_truncates_fraction() {
        assert_eq!(parse_integer("77").unwrap(), 77);
        assert_eq!(parse_integer("77.9").unwrap(), 77);
        assert_eq!(parse_integer(" 12. ").unwrap(), 12);
        assert_eq!(parse_integer("-3.5").unwrap(), -3);
    }

    #[test]
    fn test_parse_integer_rejects_garbage() {
        for raw in ["", "   ", "abc", "1a", ".5", "???"] {
            let err = parse_integer(raw).unwrap_err();
            assert!(
                matches!(err, Wr3223Error::MalformedValue { .. }),
                "{:?} -> {:?}",
                raw,
                err
            );
        }
    }

    #[test]
    fn test_relay_fixture_77() {
        let flags = decode_relay("77").unwrap();
        assert_eq!(
            flags,
            RelayFlags {
                compressor: true,
                earth_heat_exchanger: true,
                bypass: true,
                control_device_active: true,
                ..RelayFlags::default()
            }
        );
    }

    #[test]
    fn test_relay_reserved_bit_sets_nothing() {
        assert_eq!(decode_relay("1024").unwrap(), RelayFlags::default());
    }

    #[test]
    fn test_relay_high_flags() {
        let flags = decode_relay("6400.0").unwrap(); // 4096 + 2048 + 256
        assert!(flags.pre_heater_radiator_active);
        assert!(flags.magnet_valve);
        assert!(flags.ventilation_level_available);
        assert!(!flags.warm_water_post_heater);
        assert!(!flags.control_device_active);
    }

    #[test]
    fn test_status_encode_fixture() {
        let request = SetpointRequest {
            heat_pump_on: false,
            ventilation_level: 2,
            additional_heater_on: false,
            cooling_on: false,
        };
        assert_eq!(encode_status(&request), "43");
    }

    #[test]
    fn test_status_encode_levels() {
        let mut request = SetpointRequest {
            heat_pump_on: true,
            ventilation_level: 0,
            additional_heater_on: true,
            cooling_on: true,
        };
        assert_eq!(encode_status(&request), "16");
        request.ventilation_level = 1;
        assert_eq!(encode_status(&request), "6");
        request.ventilation_level = 2;
        assert_eq!(encode_status(&request), "2");
        request.ventilation_level = 3;
        assert_eq!(encode_status(&request), "4");
    }

    #[test]
    fn test_status_decode_inverted() {
        let flags = decode_status("-48").unwrap(); // 16 + 32
        assert!(flags.malfunction);
        assert!(flags.heat_pump_on);
        assert!(!flags.additional_heater_on);

        // Positive values invert to bits outside the mask region
        let flags = decode_status("-128").unwrap();
        assert_eq!(flags, StatusFlags::default());

        let flags = decode_status("-79.0").unwrap(); // 64 + 15, low bits masked off
        assert!(flags.additional_heater_on);
        assert!(!flags.malfunction);
    }

    #[test]
    fn test_error_submask_rule() {
        let flags = decode_errors("3").unwrap();
        assert!(flags.temp_sensor_interrupt);
        // Mask 1 and mask 2 are each contained in 3 as well
        assert!(flags.temp_sensor_short);
        assert!(flags.offset);
        assert!(!flags.high_pressure);
        assert!(!flags.sys_ram);

        let flags = decode_errors("2").unwrap();
        assert!(flags.offset);
        assert!(!flags.temp_sensor_interrupt);
        assert!(!flags.temp_sensor_short);
    }

    #[test]
    fn test_error_multi_bit_masks() {
        // 61 = 0b0111101
        let flags = decode_errors("61").unwrap();
        assert!(flags.sys_ram);
        assert!(!flags.sys_rom);
        assert!(flags.high_pressure);

        // 133 = 128 + 4 + 1 also contains 128, 132, 4 and 1
        let flags = decode_errors("133").unwrap();
        assert!(flags.preheating);
        assert!(flags.supply_air);
        assert!(flags.outgoing_air);
        assert!(!flags.condenser);
        assert!(flags.any());

        assert!(!decode_errors("0").unwrap().any());
    }

    #[test]
    fn test_blockade() {
        assert!(decode_blockade("-1").unwrap());
        assert!(decode_blockade("-3.").unwrap());
        assert!(!decode_blockade("-2").unwrap());
        assert!(!decode_blockade("0").unwrap());
        assert!(decode_blockade("x").is_err());
    }

    #[test]
    fn test_codec_facade() {
        assert_eq!(Wr3223Codec::keep_alive(&SetpointRequest::default()), "43");
        assert!(Wr3223Codec::relay("64").unwrap().control_device_active);
        assert!(Wr3223Codec::blockade("-1").unwrap());
        assert!(Wr3223Codec::errors("4").unwrap().high_pressure);
        assert!(Wr3223Codec::status("-16").unwrap().malfunction);
    }

    const RELAY_TABLE: [i64; 12] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 2048, 4096];

    fn relay_bits(flags: &RelayFlags) -> i64 {
        let set = [
            flags.compressor,
            flags.additional_heater,
            flags.earth_heat_exchanger,
            flags.bypass,
            flags.preheating_radiator,
            flags.bypass_relay,
            flags.control_device_active,
            flags.host_interface_active,
            flags.ventilation_level_available,
            flags.warm_water_post_heater,
            flags.magnet_valve,
            flags.pre_heater_radiator_active,
        ];
        RELAY_TABLE
            .iter()
            .zip(set)
            .filter(|(_, on)| *on)
            .map(|(mask, _)| *mask)
            .sum()
    }

    proptest! {
        #[test]
        fn prop_relay_flags_match_table(value in 0i64..8192) {
            let flags = decode_relay(&value.to_string()).unwrap();
            prop_assert_eq!(relay_bits(&flags), value & !1024 & 0x1FFF);
        }

        #[test]
        fn prop_fraction_is_ignored(value in -100_000i64..100_000, frac in 0u32..1000) {
            let whole = value.to_string();
            let with_fraction = format!("{}.{}", value, frac);
            prop_assert_eq!(decode_relay(&whole).unwrap(), decode_relay(&with_fraction).unwrap());
            prop_assert_eq!(decode_status(&whole).unwrap(), decode_status(&with_fraction).unwrap());
        }

        #[test]
        fn prop_status_encode_is_decimal_within_six_bits(
            heat_pump_on in any::<bool>(),
            level in 0u8..=3,
            heater in any::<bool>(),
            cooling in any::<bool>(),
        ) {
            let request = SetpointRequest {
                heat_pump_on,
                ventilation_level: level,
                additional_heater_on: heater,
                cooling_on: cooling,
            };
            let value: i64 = encode_status(&request).parse().unwrap();
            prop_assert!((0..64).contains(&value));
            prop_assert_eq!(value & SW_LEVEL_OFF != 0, level == 0);
        }
    }
}
