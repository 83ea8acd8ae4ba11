// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification collaborator: best-effort push events keyed by branch or
//! counter, consumed by display boards and staff dashboards.

use async_trait::async_trait;

use crate::error::TurnioError;
use crate::types::{BranchId, CounterId, CounterStatus, StaffId};

/// Push-event sink for queue state changes.
///
/// Delivery is best-effort. The engine catches and logs failures from every
/// method here; none of them may roll back or fail the state transition that
/// triggered the event.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A ticket belonging to `branch` changed in a way relevant to `counter`.
    async fn ticket_updated(
        &self,
        branch: &BranchId,
        counter: &CounterId,
    ) -> Result<(), TurnioError>;

    /// A counter's own record changed (current ticket, routing eligibility).
    async fn counter_updated(&self, counter: &CounterId) -> Result<(), TurnioError>;

    /// A counter's operational status changed.
    async fn counter_status_changed(
        &self,
        counter: &CounterId,
        status: CounterStatus,
    ) -> Result<(), TurnioError>;

    /// A staff member now occupies the counter.
    async fn counter_assigned(
        &self,
        branch: &BranchId,
        counter: &CounterId,
        staff: &StaffId,
        staff_name: &str,
    ) -> Result<(), TurnioError>;

    /// The counter no longer has an assignee.
    async fn counter_unassigned(
        &self,
        branch: &BranchId,
        counter: &CounterId,
    ) -> Result<(), TurnioError>;
}
