//! # Pending Writes
//!
//! Coalescing map of point values waiting to be written to the controller.
//!
//! ## How It Works
//!
//! The dispatcher records values with [`PendingWrites::set`]. Setting the same
//! point again replaces the queued value, so only the latest value reaches the
//! wire. The polling cycle takes a [`snapshot`](PendingWrites::snapshot), sends
//! each entry and then calls [`acknowledge`](PendingWrites::acknowledge), which
//! removes the entry only when it still holds the value that was sent. A newer
//! value queued while the send was in flight survives for the next cycle.
//!
//! Entries are never dropped on failure and survive reconnects.
//!
//! ## Example
//!
//! ```rust
//! use wr3223::catalog::PointId;
//! use wr3223::pending::PendingWrites;
//!
//! let mut pending = PendingWrites::new();
//! pending.set(PointId::OperationMode, 10);
//! pending.set(PointId::OperationMode, 20);
//!
//! let batch = pending.snapshot();
//! assert_eq!(batch, vec![(PointId::OperationMode, 20)]);
//!
//! // Sent successfully
//! assert!(pending.acknowledge(PointId::OperationMode, 20));
//! assert!(pending.is_empty());
//! ```

use std::collections::HashMap;

use crate::catalog::PointId;

/// Point values awaiting transmission.
#[derive(Debug, Default, Clone)]
pub struct PendingWrites {
    values: HashMap<PointId, i64>,
}

impl PendingWrites {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a value, replacing any value already queued for the point.
    pub fn set(&mut self, point: PointId, value: i64) {
        self.values.insert(point, value);
    }

    /// Queued value for a point.
    #[inline]
    pub fn get(&self, point: PointId) -> Option<i64> {
        self.values.get(&point).copied()
    }

    /// True when a write is queued for the point.
    ///
    /// The generic read phase skips such points so a stale controller value
    /// does not overwrite the one the user just set.
    #[inline]
    pub fn contains(&self, point: PointId) -> bool {
        self.values.contains_key(&point)
    }

    /// Number of queued writes.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy of the queued writes in catalog order.
    pub fn snapshot(&self) -> Vec<(PointId, i64)> {
        let mut batch: Vec<(PointId, i64)> = self.values.iter().map(|(p, v)| (*p, *v)).collect();
        batch.sort_by_key(|(point, _)| *point);
        batch
    }

    /// Remove the entry after a successful send.
    ///
    /// Returns `false` and keeps the entry when it was replaced in the meantime.
    pub fn acknowledge(&mut self, point: PointId, sent: i64) -> bool {
        match self.values.get(&point) {
            Some(&current) if current == sent => {
                self.values.remove(&point);
                true
            }
            _ => false,
        }
    }

    /// Drop every queued write.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut pending = PendingWrites::new();
        pending.set(PointId::OperationMode, 10);
        pending.set(PointId::OperationMode, 20);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending.get(PointId::OperationMode), Some(20));
        assert_eq!(pending.snapshot(), vec![(PointId::OperationMode, 20)]);
    }

    #[test]
    fn test_acknowledge_removes_sent_value() {
        let mut pending = PendingWrites::new();
        pending.set(PointId::TemperatureSupplyAirTarget, 21);
        assert!(pending.contains(PointId::TemperatureSupplyAirTarget));

        assert!(pending.acknowledge(PointId::TemperatureSupplyAirTarget, 21));
        assert!(!pending.contains(PointId::TemperatureSupplyAirTarget));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_acknowledge_keeps_newer_value() {
        let mut pending = PendingWrites::new();
        pending.set(PointId::TemperatureSupplyAirTarget, 21);
        let batch = pending.snapshot();

        // Dispatcher queues a new value while the batch is on the wire
        pending.set(PointId::TemperatureSupplyAirTarget, 23);

        for (point, value) in batch {
            assert!(!pending.acknowledge(point, value));
        }
        assert_eq!(pending.get(PointId::TemperatureSupplyAirTarget), Some(23));
    }

    #[test]
    fn test_acknowledge_unknown_point() {
        let mut pending = PendingWrites::new();
        assert!(!pending.acknowledge(PointId::OperationMode, 1));
    }

    #[test]
    fn test_snapshot_in_catalog_order() {
        let mut pending = PendingWrites::new();
        pending.set(PointId::WarmWaterTargetTemperature, 50);
        pending.set(PointId::OperationMode, 3);
        pending.set(PointId::TemperatureSupplyAirTarget, 20);

        let points: Vec<PointId> = pending.snapshot().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            points,
            vec![
                PointId::OperationMode,
                PointId::TemperatureSupplyAirTarget,
                PointId::WarmWaterTargetTemperature
            ]
        );

        pending.clear();
        assert!(pending.is_empty());
    }
}
