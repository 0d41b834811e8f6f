//! Local setpoint state
//!
//! The ventilation level and the heat pump / heater / cooling toggles are not
//! written individually. They live here and are sent as one status word with
//! every keep-alive. The derived half mirrors what the controller last reported.

use crate::codec::{encode_status, SetpointRequest, StatusFlags};
use crate::error::{Wr3223Error, Wr3223Result};

/// Highest ventilation level accepted by the controller.
pub const MAX_VENTILATION_LEVEL: i64 = 3;

/// Requested and reported setpoint state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetpointState {
    /// Written only by the dispatcher
    pub requested: SetpointRequest,
    /// Written only by status word decoding
    pub reported: StatusFlags,
}

impl SetpointState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested ventilation level (0 = off, 1-3).
    pub fn set_ventilation_level(&mut self, level: i64) -> Wr3223Result<()> {
        match u8::try_from(level) {
            Ok(valid) if level <= MAX_VENTILATION_LEVEL => {
                self.requested.ventilation_level = valid;
                Ok(())
            }
            _ => Err(Wr3223Error::OutOfRange {
                channel: "ventilationLevel".to_string(),
                value: level,
            }),
        }
    }

    pub fn set_heat_pump(&mut self, on: bool) {
        self.requested.heat_pump_on = on;
    }

    pub fn set_additional_heater(&mut self, on: bool) {
        self.requested.additional_heater_on = on;
    }

    pub fn set_cooling(&mut self, on: bool) {
        self.requested.cooling_on = on;
    }

    /// Record the state decoded from the status word.
    pub fn apply_status(&mut self, flags: StatusFlags) {
        self.reported = flags;
    }

    /// Keep-alive payload for the current request.
    pub fn keep_alive_payload(&self) -> String {
        encode_status(&self.requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = SetpointState::new();
        assert_eq!(state.requested.ventilation_level, 2);
        assert!(!state.requested.heat_pump_on);
        assert!(!state.requested.additional_heater_on);
        assert!(!state.requested.cooling_on);
        assert_eq!(state.keep_alive_payload(), "43");
    }

    #[test]
    fn test_ventilation_level_range() {
        let mut state = SetpointState::new();
        assert!(state.set_ventilation_level(3).is_ok());
        assert_eq!(state.requested.ventilation_level, 3);

        let err = state.set_ventilation_level(4).unwrap_err();
        assert!(matches!(err, Wr3223Error::OutOfRange { value: 4, .. }));
        assert!(state.set_ventilation_level(-1).is_err());
        assert_eq!(state.requested.ventilation_level, 3);

        assert!(state.set_ventilation_level(0).is_ok());
        assert_eq!(state.keep_alive_payload(), "57"); // 1 + 8 + 16 + 32
    }

    #[test]
    fn test_toggles_feed_keep_alive() {
        let mut state = SetpointState::new();
        state.set_heat_pump(true);
        state.set_additional_heater(true);
        state.set_cooling(true);
        assert_eq!(state.keep_alive_payload(), "2");
    }

    #[test]
    fn test_apply_status() {
        let mut state = SetpointState::new();
        state.apply_status(StatusFlags {
            malfunction: true,
            ..StatusFlags::default()
        });
        assert!(state.reported.malfunction);
        assert_eq!(state.requested, SetpointRequest::default());
    }
}
