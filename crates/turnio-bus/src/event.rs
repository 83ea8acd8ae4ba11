// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event types published on the queue bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use turnio_core::{BranchId, CounterId, CounterStatus, StaffId};

/// A queue state change, keyed by the branch or counter it concerns.
///
/// Subscribers fan these out to display boards and staff dashboards; the
/// variants mirror the engine's notification surface one to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    TicketUpdated {
        branch_id: BranchId,
        counter_id: CounterId,
    },
    CounterUpdated {
        counter_id: CounterId,
    },
    CounterStatusChanged {
        counter_id: CounterId,
        status: CounterStatus,
    },
    CounterAssigned {
        branch_id: BranchId,
        counter_id: CounterId,
        staff_id: StaffId,
        staff_name: String,
    },
    CounterUnassigned {
        branch_id: BranchId,
        counter_id: CounterId,
    },
}

impl QueueEvent {
    /// Stable label used for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            QueueEvent::TicketUpdated { .. } => "ticket_updated",
            QueueEvent::CounterUpdated { .. } => "counter_updated",
            QueueEvent::CounterStatusChanged { .. } => "counter_status_changed",
            QueueEvent::CounterAssigned { .. } => "counter_assigned",
            QueueEvent::CounterUnassigned { .. } => "counter_unassigned",
        }
    }
}

/// A published event plus delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique id of this publication.
    pub id: String,
    pub occurred_at: DateTime<Utc>,
    pub event: QueueEvent,
}

impl Envelope {
    pub fn new(event: QueueEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            occurred_at: Utc::now(),
            event,
        }
    }
}
