//! Per-connection capability detection
//!
//! Firmware revisions differ in which commands they implement. An unknown
//! command is answered with `???` instead of a value. Such commands are
//! remembered for the lifetime of the connection so later cycles skip them
//! without wire traffic. Supported commands are not cached and are simply
//! probed again on the next cycle.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::command::ProtocolCommand;
use crate::constants::UNSUPPORTED_SENTINEL;
use crate::error::Wr3223Result;
use crate::transport::Wr3223Transport;

/// Commands confirmed unsupported on the current connection.
#[derive(Debug, Default, Clone)]
pub struct CapabilityCache {
    unsupported: HashSet<ProtocolCommand>,
}

/// True when a raw read value marks the command as unsupported.
pub fn is_unsupported_response(raw: &str) -> bool {
    let value = raw.trim();
    value.is_empty() || value.contains(UNSUPPORTED_SENTINEL)
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_known_unsupported(&self, command: ProtocolCommand) -> bool {
        self.unsupported.contains(&command)
    }

    pub fn mark_unsupported(&mut self, command: ProtocolCommand) {
        if self.unsupported.insert(command) {
            warn!("Command {} is not supported by the controller", command);
        }
    }

    /// Forget everything. Called whenever the connection is dropped.
    pub fn clear(&mut self) {
        if !self.unsupported.is_empty() {
            debug!("Clearing {} unsupported command(s)", self.unsupported.len());
        }
        self.unsupported.clear();
    }

    pub fn len(&self) -> usize {
        self.unsupported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// Read `command` unless it is known to be unsupported.
    ///
    /// Returns the raw value when the controller implements the command and
    /// `None` otherwise. A command already known to be unsupported is answered
    /// without touching the transport. Transport errors are returned unchanged.
    pub async fn probe<T: Wr3223Transport>(
        &mut self,
        transport: &mut T,
        command: ProtocolCommand,
    ) -> Wr3223Result<Option<String>> {
        if self.is_known_unsupported(command) {
            return Ok(None);
        }
        let raw = transport.read(command).await?;
        if is_unsupported_response(&raw) {
            self.mark_unsupported(command);
            return Ok(None);
        }
        Ok(Some(raw))
    }

    /// Probe whether the controller implements `command`.
    pub async fn is_available<T: Wr3223Transport>(
        &mut self,
        transport: &mut T,
        command: ProtocolCommand,
    ) -> Wr3223Result<bool> {
        Ok(self.probe(transport, command).await?.is_some())
    }
}
