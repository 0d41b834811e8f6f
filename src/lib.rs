//! # WR3223 - Async client for WR3223 ventilation controllers
//!
//! Polls and controls a WR3223 ventilation / heat-recovery controller over TCP
//! or a serial line. The crate covers the protocol engine: the point catalog,
//! the periodic read/write cycle with per-connection capability detection,
//! the decoders for the packed status, relay, error and blockade words, and
//! the coalescing queue of pending writes.
//!
//! ## Features
//!
//! - **Async**: Tokio transports, one polling task per controller
//! - **Coalesced writes**: only the latest value per point reaches the wire
//! - **Capability detection**: commands the firmware answers with `???` are skipped
//! - **Serial and TCP**: serial support behind the `serial` feature
//!
//! ## Composite Words
//!
//! | Command | Word | Points |
//! |---------|------|--------|
//! | `Ta` | status | malfunction, heat pump / heater status |
//! | `Tf` | EVU blockade | evuBlockade |
//! | `RL` | relay | compressor, bypass, controlDeviceActive, ... |
//! | `ER` | error | 13 error flags |
//! | `SW` | keep-alive (write) | ventilation level, heat pump / heater / cooling requests |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wr3223::{
//!     CommandValue, Controller, LinkConnector, LinkStatus, Observer, PointId, Poller,
//!     Wr3223Config, Wr3223Result,
//! };
//!
//! struct Print;
//!
//! impl Observer for Print {
//!     fn publish(&self, point: PointId, value: &str) {
//!         println!("{} = {}", point.channel(), value);
//!     }
//!
//!     fn update_status(&self, status: LinkStatus) {
//!         println!("{}", status);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Wr3223Result<()> {
//!     let config = Wr3223Config::load("wr3223.toml")?;
//!     let connector = LinkConnector::new(config.connection_target()?, config.controller_addr);
//!     let controller = Arc::new(Controller::new(connector, Print));
//!     let poller = Poller::spawn(controller, config.refresh_interval());
//!
//!     poller.handle_command("ventilationLevel", CommandValue::Number(3.0))?;
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     poller.shutdown().await
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Protocol constants and flag masks
pub mod constants;

/// Two-character protocol command codes
pub mod command;

/// Wire frame encoding and validation
pub mod frame;

/// Network transport layer for TCP and serial links
pub mod transport;

/// Logging setup for binaries
pub mod logging;

/// Configuration loading
pub mod config;

// ============================================================================
// Controller modules
// ============================================================================

/// Static table of logical points
pub mod catalog;

/// Decoders for the packed status words
pub mod codec;

/// Requested ventilation level and toggles
pub mod setpoint;

/// Coalescing queue of pending writes
pub mod pending;

/// Per-connection unsupported-command cache
pub mod capability;

/// Polling cycle and command dispatcher
pub mod controller;

/// Periodic polling task
pub mod poller;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime ===
pub use tokio;

// === Error handling ===
pub use error::{Wr3223Error, Wr3223Result};

// === Controller API ===
pub use controller::{
    parse_boolean_state, CommandValue, Controller, CycleOutcome, Dispatch, LinkStatus,
    Observer, OfflineReason,
};
pub use poller::{Poller, PollerHandle};

// === Core types ===
pub use catalog::{LogicalPoint, PointId, ValueShape};
pub use codec::{ErrorFlags, RelayFlags, SetpointRequest, StatusFlags, Wr3223Codec};
pub use command::ProtocolCommand;
pub use pending::PendingWrites;
pub use setpoint::SetpointState;

// === Transport ===
pub use transport::{
    Connector, Link, LinkConnector, LinkTransport, StreamTransport, TransportStats,
    Wr3223Transport,
};

// === Configuration and logging ===
pub use config::{ConnectionTarget, Wr3223Config};
pub use logging::init_logging;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!("WR3223 client v{}", VERSION)
}
