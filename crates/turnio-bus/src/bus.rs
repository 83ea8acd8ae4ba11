// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast bus and the [`Notifier`] implementation that publishes to it.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use turnio_core::{BranchId, CounterId, CounterStatus, Notifier, StaffId, TurnioError};

use crate::event::{Envelope, QueueEvent};

/// Default broadcast channel capacity. Slow subscribers past this depth see
/// `Lagged` and miss events, which the best-effort contract permits.
pub const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus for [`QueueEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Envelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Publishes an event, returning how many subscribers received it.
    /// Zero subscribers is a normal state, not a failure.
    pub fn publish(&self, event: QueueEvent) -> usize {
        let envelope = Envelope::new(event);
        trace!(event = envelope.event.kind(), event_id = %envelope.id, "event published");
        self.sender.send(envelope).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// [`Notifier`] that publishes every notification as a bus event.
///
/// Publication cannot fail: a broadcast with no receivers just drops the
/// envelope, matching the best-effort delivery the engine expects.
#[derive(Debug, Clone)]
pub struct BusNotifier {
    bus: EventBus,
}

impl BusNotifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

#[async_trait]
impl Notifier for BusNotifier {
    async fn ticket_updated(
        &self,
        branch: &BranchId,
        counter: &CounterId,
    ) -> Result<(), TurnioError> {
        self.bus.publish(QueueEvent::TicketUpdated {
            branch_id: branch.clone(),
            counter_id: counter.clone(),
        });
        Ok(())
    }

    async fn counter_updated(&self, counter: &CounterId) -> Result<(), TurnioError> {
        self.bus.publish(QueueEvent::CounterUpdated {
            counter_id: counter.clone(),
        });
        Ok(())
    }

    async fn counter_status_changed(
        &self,
        counter: &CounterId,
        status: CounterStatus,
    ) -> Result<(), TurnioError> {
        self.bus.publish(QueueEvent::CounterStatusChanged {
            counter_id: counter.clone(),
            status,
        });
        Ok(())
    }

    async fn counter_assigned(
        &self,
        branch: &BranchId,
        counter: &CounterId,
        staff: &StaffId,
        staff_name: &str,
    ) -> Result<(), TurnioError> {
        self.bus.publish(QueueEvent::CounterAssigned {
            branch_id: branch.clone(),
            counter_id: counter.clone(),
            staff_id: staff.clone(),
            staff_name: staff_name.to_string(),
        });
        Ok(())
    }

    async fn counter_unassigned(
        &self,
        branch: &BranchId,
        counter: &CounterId,
    ) -> Result<(), TurnioError> {
        self.bus.publish(QueueEvent::CounterUnassigned {
            branch_id: branch.clone(),
            counter_id: counter.clone(),
        });
        Ok(())
    }
}
