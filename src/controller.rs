//! Polling cycle and command dispatcher
//!
//! One [`Controller`] drives one WR3223. A cycle connects if needed, reads the
//! composite words, sends the keep-alive and any pending writes, and finally
//! polls the ordinary points the observer cares about:
//!
//! 1. status word `Ta` (if supported)
//! 2. EVU blockade word `Tf` (if supported)
//! 3. relay word `RL`
//! 4. error word `ER` (if supported)
//! 5. keep-alive `SW`, then pending writes, unless a control panel is active
//! 6. generic reads
//!
//! Any communication failure aborts the cycle, drops the connection and
//! forgets which commands were unsupported. Pending writes are kept.
//!
//! The dispatcher runs on the caller's task. It shares the setpoint state and
//! the pending writes with the cycle through a short-held mutex; the
//! connection itself is owned by the cycle.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::capability::CapabilityCache;
use crate::catalog::{self, PointId};
use crate::codec::{self, ErrorFlags, RelayFlags};
use crate::command::ProtocolCommand;
use crate::error::{Wr3223Error, Wr3223Result};
use crate::pending::PendingWrites;
use crate::setpoint::SetpointState;
use crate::transport::{Connector, Wr3223Transport};

// ============================================================================
// Observer Boundary
// ============================================================================

/// Why the controller is offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineReason {
    CommunicationError,
    ConfigurationError,
}

/// Connection status reported to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Online,
    Offline {
        reason: OfflineReason,
        description: String,
    },
}

impl LinkStatus {
    fn from_error(err: &Wr3223Error) -> Self {
        let reason = match err {
            Wr3223Error::Configuration { .. } => OfflineReason::ConfigurationError,
            _ => OfflineReason::CommunicationError,
        };
        Self::Offline {
            reason,
            description: err.to_string(),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => f.write_str("ONLINE"),
            Self::Offline {
                reason,
                description,
            } => write!(f, "OFFLINE ({:?}): {}", reason, description),
        }
    }
}

/// Receives decoded values and connection status.
pub trait Observer: Send + Sync {
    /// A new value for a point. Numbers are trimmed decimal text, flags are
    /// `"true"` or `"false"`.
    fn publish(&self, point: PointId, value: &str);

    /// Whether anyone consumes the point. Unlinked points are not polled.
    fn is_linked(&self, _point: PointId) -> bool {
        true
    }

    fn update_status(&self, status: LinkStatus);
}

impl<T: Observer + ?Sized> Observer for Arc<T> {
    fn publish(&self, point: PointId, value: &str) {
        (**self).publish(point, value)
    }

    fn is_linked(&self, point: PointId) -> bool {
        (**self).is_linked(point)
    }

    fn update_status(&self, status: LinkStatus) {
        (**self).update_status(status)
    }
}

/// Interpret a published flag value: `"true"` (any case), `"1"` or `"1."`.
pub fn parse_boolean_state(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1" || value == "1."
}

#[inline]
fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

// ============================================================================
// Dispatcher Types
// ============================================================================

/// Value carried by an inbound command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandValue {
    Number(f64),
    OnOff(bool),
    OpenClosed { closed: bool },
    /// Poll now instead of waiting for the next tick
    Refresh,
}

/// What a dispatched command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Ventilation level or a toggle changed; sent with the next keep-alive
    SetpointUpdated,
    /// Wire write queued for the next write phase
    WriteQueued { point: PointId, value: i64 },
    RefreshRequested,
}

/// Result of one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// `None` when the relay word could not be decoded
    pub panel_active: Option<bool>,
    /// `None` when the write phase was skipped
    pub keep_alive_accepted: Option<bool>,
    pub writes_sent: usize,
    pub writes_rejected: usize,
    pub points_read: usize,
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug, Default)]
struct Shared {
    setpoint: SetpointState,
    pending: PendingWrites,
}

struct Session<T> {
    transport: Option<T>,
    capabilities: CapabilityCache,
}

/// Polling engine for one controller.
pub struct Controller<C: Connector, O: Observer> {
    connector: C,
    observer: O,
    shared: Arc<Mutex<Shared>>,
    session: tokio::sync::Mutex<Session<C::Transport>>,
}

impl<C: Connector, O: Observer> Controller<C, O> {
    pub fn new(connector: C, observer: O) -> Self {
        Self {
            connector,
            observer,
            shared: Arc::new(Mutex::new(Shared::default())),
            session: tokio::sync::Mutex::new(Session {
                transport: None,
                capabilities: CapabilityCache::new(),
            }),
        }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Copy of the current setpoint state.
    pub fn setpoint(&self) -> SetpointState {
        self.shared.lock().setpoint
    }

    /// Copy of the queued writes.
    pub fn pending_writes(&self) -> PendingWrites {
        self.shared.lock().pending.clone()
    }

    pub async fn is_connected(&self) -> bool {
        let session = self.session.lock().await;
        session
            .transport
            .as_ref()
            .is_some_and(|transport| transport.is_connected())
    }

    // ------------------------------------------------------------------------
    // Dispatcher
    // ------------------------------------------------------------------------

    /// Apply an inbound command.
    ///
    /// Rejections never reach the wire.
    pub fn handle_command(&self, channel: &str, value: CommandValue) -> Wr3223Result<Dispatch> {
        let result = self.dispatch(channel, value);
        match &result {
            Ok(dispatch) => debug!("Command {} {:?} -> {:?}", channel, value, dispatch),
            Err(e) => warn!("Command {} {:?} rejected: {}", channel, value, e),
        }
        result
    }

    fn dispatch(&self, channel: &str, value: CommandValue) -> Wr3223Result<Dispatch> {
        let point = catalog::lookup(channel).ok_or_else(|| Wr3223Error::UnknownPoint {
            channel: channel.to_string(),
        })?;

        if value == CommandValue::Refresh {
            return Ok(Dispatch::RefreshRequested);
        }

        match point.id {
            PointId::VentilationLevel => {
                let level = coerce_number(channel, value)?;
                self.shared.lock().setpoint.set_ventilation_level(level)?;
                Ok(Dispatch::SetpointUpdated)
            }
            PointId::AdditionalHeaterActivate => {
                let on = expect_on_off(channel, value)?;
                self.shared.lock().setpoint.set_additional_heater(on);
                Ok(Dispatch::SetpointUpdated)
            }
            PointId::HeatPumpActivate => {
                let on = expect_on_off(channel, value)?;
                self.shared.lock().setpoint.set_heat_pump(on);
                Ok(Dispatch::SetpointUpdated)
            }
            PointId::CoolingMode => {
                let on = expect_on_off(channel, value)?;
                self.shared.lock().setpoint.set_cooling(on);
                Ok(Dispatch::SetpointUpdated)
            }
            id if catalog::is_writable(id) => {
                let value = coerce_integer(channel, value)?;
                self.shared.lock().pending.set(id, value);
                Ok(Dispatch::WriteQueued { point: id, value })
            }
            _ => Err(Wr3223Error::NotWritable {
                channel: channel.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Polling Cycle
    // ------------------------------------------------------------------------

    /// Run one polling cycle.
    ///
    /// Returns the connection or communication error that ended the cycle
    /// early; the connection has already been dropped in that case.
    pub async fn run_cycle(&self) -> Wr3223Result<CycleOutcome> {
        let mut guard = self.session.lock().await;
        let session = &mut *guard;

        if session.transport.is_none() {
            match self.connector.connect().await {
                Ok(transport) => {
                    info!("Connected to controller");
                    session.capabilities.clear();
                    session.transport = Some(transport);
                    self.observer.update_status(LinkStatus::Online);
                }
                Err(e) => {
                    error!("Connect failed: {}", e);
                    self.observer.update_status(LinkStatus::from_error(&e));
                    return Err(e);
                }
            }
        }

        let Some(transport) = session.transport.as_mut() else {
            return Err(Wr3223Error::connection("Transport is closed"));
        };
        let result = self.poll(transport, &mut session.capabilities).await;

        if let Err(e) = &result {
            error!("Cycle aborted: {}", e);
            if let Some(mut transport) = session.transport.take() {
                if let Err(close_err) = transport.close().await {
                    debug!("Close after failure: {}", close_err);
                }
            }
            session.capabilities.clear();
            self.observer.update_status(LinkStatus::from_error(e));
        }
        result
    }

    /// Close the connection. The next cycle reconnects.
    pub async fn close(&self) -> Wr3223Result<()> {
        let mut session = self.session.lock().await;
        session.capabilities.clear();
        match session.transport.take() {
            Some(mut transport) => transport.close().await,
            None => Ok(()),
        }
    }

    async fn poll(
        &self,
        transport: &mut C::Transport,
        capabilities: &mut CapabilityCache,
    ) -> Wr3223Result<CycleOutcome> {
        let mut outcome = CycleOutcome::default();

        if let Some(raw) = capabilities.probe(transport, ProtocolCommand::Ta).await? {
            self.publish_status(&raw);
        }

        if let Some(raw) = capabilities.probe(transport, ProtocolCommand::Tf).await? {
            match codec::decode_blockade(&raw) {
                Ok(blocked) => self.observer.publish(PointId::EvuBlockade, flag(blocked)),
                Err(e) => warn!("Blockade word: {}", e),
            }
        }

        let raw = transport.read(ProtocolCommand::Rl).await?;
        let relay = match codec::decode_relay(&raw) {
            Ok(flags) => {
                self.publish_relay(&flags);
                Some(flags)
            }
            Err(e) => {
                warn!("Relay word: {}", e);
                None
            }
        };

        if let Some(raw) = capabilities.probe(transport, ProtocolCommand::Er).await? {
            match codec::decode_errors(&raw) {
                Ok(flags) => self.publish_errors(&flags),
                Err(e) => warn!("Error word: {}", e),
            }
        }

        match relay {
            Some(flags) if flags.control_device_active => {
                outcome.panel_active = Some(true);
                warn!("Control panel active, skipping keep-alive and pending writes");
            }
            Some(_) => {
                outcome.panel_active = Some(false);
                self.write_phase(transport, &mut outcome).await?;
            }
            None => warn!("Panel state unknown, skipping keep-alive and pending writes"),
        }

        for point in catalog::read_points() {
            let Some(command) = point.command else {
                continue;
            };
            let shadowed = self.shared.lock().pending.contains(point.id);
            if shadowed || !self.observer.is_linked(point.id) {
                continue;
            }
            if let Some(raw) = capabilities.probe(transport, command).await? {
                self.observer.publish(point.id, raw.trim());
                outcome.points_read += 1;
            }
        }

        debug!("Cycle complete: {:?}", outcome);
        Ok(outcome)
    }

    async fn write_phase(
        &self,
        transport: &mut C::Transport,
        outcome: &mut CycleOutcome,
    ) -> Wr3223Result<()> {
        let payload = self.shared.lock().setpoint.keep_alive_payload();
        let accepted = transport.write(ProtocolCommand::Sw, &payload).await?;
        outcome.keep_alive_accepted = Some(accepted);
        if !accepted {
            warn!("Keep-alive {} rejected, holding pending writes", payload);
            return Ok(());
        }

        let batch = self.shared.lock().pending.snapshot();
        for (point, value) in batch {
            let Some(command) = point.info().command else {
                continue;
            };
            if transport.write(command, &value.to_string()).await? {
                self.shared.lock().pending.acknowledge(point, value);
                outcome.writes_sent += 1;
            } else {
                warn!("Write {}={} rejected, will retry", point.channel(), value);
                outcome.writes_rejected += 1;
            }
        }
        Ok(())
    }

    fn publish_status(&self, raw: &str) {
        match codec::decode_status(raw) {
            Ok(status) => {
                self.shared.lock().setpoint.apply_status(status);
                self.observer
                    .publish(PointId::Malfunction, flag(status.malfunction));
                self.observer
                    .publish(PointId::HeatPumpStatus, flag(status.heat_pump_on));
                self.observer.publish(
                    PointId::AdditionalHeaterStatus,
                    flag(status.additional_heater_on),
                );
            }
            Err(e) => warn!("Status word: {}", e),
        }
    }

    fn publish_relay(&self, relay: &RelayFlags) {
        let values = [
            (PointId::Compressor, relay.compressor),
            (PointId::AdditionalHeaterRelay, relay.additional_heater),
            (PointId::EarthHeatExchanger, relay.earth_heat_exchanger),
            // The relay bit reports the flap closed
            (PointId::Bypass, !relay.bypass),
            (PointId::PreheatingRadiator, relay.preheating_radiator),
            (PointId::BypassRelay, relay.bypass_relay),
            (PointId::ControlDeviceActive, relay.control_device_active),
            (PointId::HostInterfaceActive, relay.host_interface_active),
            (
                PointId::VentilationLevelAvailable,
                relay.ventilation_level_available,
            ),
            (PointId::WarmWaterPostHeater, relay.warm_water_post_heater),
            (PointId::MagnetValve, relay.magnet_valve),
            (
                PointId::PreheatingRadiatorActive,
                relay.pre_heater_radiator_active,
            ),
        ];
        for (point, value) in values {
            self.observer.publish(point, flag(value));
        }
    }

    fn publish_errors(&self, errors: &ErrorFlags) {
        let values = [
            (PointId::ErrorTempSensorShort, errors.temp_sensor_short),
            (PointId::ErrorOffset, errors.offset),
            (PointId::ErrorTempSensorInterrupt, errors.temp_sensor_interrupt),
            (PointId::ErrorHighPressure, errors.high_pressure),
            (PointId::ErrorSysRam, errors.sys_ram),
            (PointId::ErrorSysRom, errors.sys_rom),
            (PointId::ErrorSysEe, errors.sys_ee),
            (PointId::ErrorSysIo, errors.sys_io),
            (PointId::ErrorSys67Ad, errors.sys_67_ad),
            (PointId::ErrorSupplyAir, errors.supply_air),
            (PointId::ErrorCondenser, errors.condenser),
            (PointId::ErrorOutgoingAir, errors.outgoing_air),
            (PointId::ErrorPreheating, errors.preheating),
        ];
        if errors.any() {
            warn!("Controller reports errors: {:?}", errors);
        }
        for (point, value) in values {
            self.observer.publish(point, flag(value));
        }
    }
}

fn finite(channel: &str, number: f64) -> Wr3223Result<f64> {
    if number.is_finite() {
        Ok(number)
    } else {
        Err(Wr3223Error::WrongShape {
            channel: channel.to_string(),
            expected: "a finite number",
        })
    }
}

fn coerce_number(channel: &str, value: CommandValue) -> Wr3223Result<i64> {
    match value {
        CommandValue::Number(number) => Ok(finite(channel, number)?.trunc() as i64),
        _ => Err(Wr3223Error::WrongShape {
            channel: channel.to_string(),
            expected: "a number",
        }),
    }
}

fn expect_on_off(channel: &str, value: CommandValue) -> Wr3223Result<bool> {
    match value {
        CommandValue::OnOff(on) => Ok(on),
        _ => Err(Wr3223Error::WrongShape {
            channel: channel.to_string(),
            expected: "ON or OFF",
        }),
    }
}

fn coerce_integer(channel: &str, value: CommandValue) -> Wr3223Result<i64> {
    match value {
        CommandValue::Number(number) => Ok(finite(channel, number)?.trunc() as i64),
        CommandValue::OnOff(on) => Ok(i64::from(on)),
        CommandValue::OpenClosed { closed } => Ok(i64::from(closed)),
        CommandValue::Refresh => Err(Wr3223Error::WrongShape {
            channel: channel.to_string(),
            expected: "a value",
        }),
    }
}
