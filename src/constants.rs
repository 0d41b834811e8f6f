//! WR3223 protocol constants
//!
//! Control characters, timeouts and flag masks used by the WR3223 serial/TCP
//! protocol. Frames are plain ASCII framed by control characters:
//! - Read request: `EOT addr cmd ENQ`
//! - Read response: `STX cmd data ETX BCC`
//! - Write request: `EOT addr STX cmd data ETX BCC`, answered with `ACK` or `NAK`

// ============================================================================
// Control Characters
// ============================================================================

/// Start of text
pub const STX: u8 = 0x02;

/// End of text
pub const ETX: u8 = 0x03;

/// End of transmission, opens every request
pub const EOT: u8 = 0x04;

/// Enquiry, terminates a read request
pub const ENQ: u8 = 0x05;

/// Write accepted
pub const ACK: u8 = 0x06;

/// Write rejected
pub const NAK: u8 = 0x15;

// ============================================================================
// Frame Limits
// ============================================================================

/// Encoded address length: two digits, each sent twice
pub const ADDRESS_LEN: usize = 4;

/// Highest controller bus address expressible with two digits
pub const MAX_CONTROLLER_ADDRESS: u8 = 99;

/// Longest read response accepted before the frame is considered broken.
///
/// Values are short decimal strings; 64 bytes leaves room for padding.
pub const MAX_RESPONSE_LEN: usize = 64;

/// Response text returned for command codes the firmware does not know
pub const UNSUPPORTED_SENTINEL: &str = "???";

// ============================================================================
// Timing Defaults
// ============================================================================

/// Default polling interval in seconds
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15;

/// On-demand refreshes are dropped when the next tick is closer than this
pub const REFRESH_COALESCE_THRESHOLD_SECS: u64 = 5;

/// Receive timeout for serial links
pub const SERIAL_TIMEOUT_MS: u64 = 2000;

/// Read timeout for TCP links
pub const TCP_TIMEOUT_MS: u64 = 5000;

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default controller bus address
pub const DEFAULT_CONTROLLER_ADDRESS: u8 = 1;

// ============================================================================
// Status Word (Ta / SW)
// ============================================================================

/// Only bits 4-6 of the inverted status word carry state
pub const STATUS_MASK: i64 = 0b111_0000;

/// Malfunction (de: Störung)
pub const STATUS_MALFUNCTION: i64 = 16;

/// Heat pump running
pub const STATUS_HEAT_PUMP: i64 = 32;

/// Additional heater running
pub const STATUS_ADDITIONAL_HEATER: i64 = 64;

// Keep-alive (SW) bits
pub const SW_HEAT_PUMP_OFF: i64 = 1;
pub const SW_LEVEL_BIT_A: i64 = 2;
pub const SW_LEVEL_BIT_B: i64 = 4;
pub const SW_ADDITIONAL_HEATER_OFF: i64 = 8;
pub const SW_LEVEL_OFF: i64 = 16;
pub const SW_COOLING_OFF: i64 = 32;

// ============================================================================
// Relay Word (RL)
// ============================================================================

pub const RELAY_COMPRESSOR: i64 = 1;
pub const RELAY_ADDITIONAL_HEATER: i64 = 2;
pub const RELAY_EARTH_HEAT_EXCHANGER: i64 = 4;
pub const RELAY_BYPASS: i64 = 8;
pub const RELAY_PREHEATING_RADIATOR: i64 = 16;
pub const RELAY_BYPASS_RELAY: i64 = 32;
pub const RELAY_CONTROL_DEVICE_ACTIVE: i64 = 64;
pub const RELAY_HOST_INTERFACE_ACTIVE: i64 = 128;
pub const RELAY_VENTILATION_LEVEL_AVAILABLE: i64 = 256;
pub const RELAY_WARM_WATER_POST_HEATER: i64 = 512;
// 1024 is reserved
pub const RELAY_MAGNET_VALVE: i64 = 2048;
pub const RELAY_PRE_HEATER_RADIATOR_ACTIVE: i64 = 4096;

// ============================================================================
// Error Word (ER)
// ============================================================================
//
// Several of these are multi-bit values. They are tested as submasks
// (`value & mask == mask`), exactly as the controller documentation lists them.

pub const ERROR_TEMP_SENSOR_SHORT: i64 = 1;
pub const ERROR_OFFSET: i64 = 2;
pub const ERROR_TEMP_SENSOR_INTERRUPT: i64 = 3;
pub const ERROR_HIGH_PRESSURE: i64 = 4;
pub const ERROR_SYS_RAM: i64 = 61;
pub const ERROR_SYS_ROM: i64 = 62;
pub const ERROR_SYS_EE: i64 = 65;
pub const ERROR_SYS_IO: i64 = 66;
pub const ERROR_SYS_67_AD: i64 = 67;
pub const ERROR_SUPPLY_AIR: i64 = 128;
pub const ERROR_CONDENSER: i64 = 130;
pub const ERROR_OUTGOING_AIR: i64 = 132;
pub const ERROR_PREHEATING: i64 = 133;

// ============================================================================
// Blockade Word (Tf)
// ============================================================================

/// EVU (utility) blockade, bit 0 of the inverted word
pub const BLOCKADE_FLAG: i64 = 1;
