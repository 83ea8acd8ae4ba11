// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator: load-by-id, filtered queries, and the atomic
//! multi-entity unit of work the engine commits through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::TurnioError;
use crate::types::{
    Assignment, BranchId, Counter, CounterId, Staff, StaffId, Ticket, TicketId, TicketStatus,
};

/// Filter for ticket queries. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub branch_id: Option<BranchId>,
    pub counter_id: Option<CounterId>,
    /// Empty means any status.
    pub statuses: Vec<TicketStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_branch(mut self, branch: BranchId) -> Self {
        self.branch_id = Some(branch);
        self
    }

    pub fn at_counter(mut self, counter: CounterId) -> Self {
        self.counter_id = Some(counter);
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    pub fn created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    /// Whether a ticket satisfies every populated field of the filter.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(branch) = &self.branch_id {
            if ticket.branch_id != *branch {
                return false;
            }
        }
        if let Some(counter) = &self.counter_id {
            if ticket.counter_id.as_ref() != Some(counter) {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&ticket.status) {
            return false;
        }
        if let Some(from) = self.created_from {
            if ticket.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.created_to {
            if ticket.created_at > to {
                return false;
            }
        }
        true
    }
}

/// Filter for assignment-history queries. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub counter_id: Option<CounterId>,
    pub staff_id: Option<StaffId>,
    pub active_only: bool,
    pub assigned_from: Option<DateTime<Utc>>,
    pub assigned_to: Option<DateTime<Utc>>,
}

impl AssignmentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_counter(mut self, counter: CounterId) -> Self {
        self.counter_id = Some(counter);
        self
    }

    pub fn for_staff(mut self, staff: StaffId) -> Self {
        self.staff_id = Some(staff);
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn assigned_from(mut self, from: DateTime<Utc>) -> Self {
        self.assigned_from = Some(from);
        self
    }

    pub fn assigned_to(mut self, to: DateTime<Utc>) -> Self {
        self.assigned_to = Some(to);
        self
    }

    /// Whether an assignment satisfies every populated field of the filter.
    pub fn matches(&self, assignment: &Assignment) -> bool {
        if let Some(counter) = &self.counter_id {
            if assignment.counter_id != *counter {
                return false;
            }
        }
        if let Some(staff) = &self.staff_id {
            if assignment.staff_id != *staff {
                return false;
            }
        }
        if self.active_only && !assignment.is_active {
            return false;
        }
        if let Some(from) = self.assigned_from {
            if assignment.assigned_at < from {
                return false;
            }
        }
        if let Some(to) = self.assigned_to {
            if assignment.assigned_at > to {
                return false;
            }
        }
        true
    }
}

/// A unit of work: every insert and update in one changeset is applied
/// atomically by [`QueueStore::commit`], or none of it is.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    pub insert_counters: Vec<Counter>,
    pub update_counters: Vec<Counter>,
    pub insert_tickets: Vec<Ticket>,
    pub update_tickets: Vec<Ticket>,
    pub insert_assignments: Vec<Assignment>,
    pub update_assignments: Vec<Assignment>,
    pub insert_staff: Vec<Staff>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.insert_counters.is_empty()
            && self.update_counters.is_empty()
            && self.insert_tickets.is_empty()
            && self.update_tickets.is_empty()
            && self.insert_assignments.is_empty()
            && self.update_assignments.is_empty()
            && self.insert_staff.is_empty()
    }

    pub fn insert_counter(&mut self, counter: Counter) -> &mut Self {
        self.insert_counters.push(counter);
        self
    }

    pub fn update_counter(&mut self, counter: Counter) -> &mut Self {
        self.update_counters.push(counter);
        self
    }

    pub fn insert_ticket(&mut self, ticket: Ticket) -> &mut Self {
        self.insert_tickets.push(ticket);
        self
    }

    pub fn update_ticket(&mut self, ticket: Ticket) -> &mut Self {
        self.update_tickets.push(ticket);
        self
    }

    pub fn insert_assignment(&mut self, assignment: Assignment) -> &mut Self {
        self.insert_assignments.push(assignment);
        self
    }

    pub fn update_assignment(&mut self, assignment: Assignment) -> &mut Self {
        self.update_assignments.push(assignment);
        self
    }

    pub fn insert_staff(&mut self, staff: Staff) -> &mut Self {
        self.insert_staff.push(staff);
        self
    }
}

/// Persistence collaborator for counters, tickets, assignments, and staff.
///
/// The engine assumes [`commit`](QueueStore::commit) either fully applies or
/// fully rejects: a partially applied changeset (sequence incremented but
/// ticket missing, say) is corruption the store must prevent.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn get_counter(&self, id: &CounterId) -> Result<Option<Counter>, TurnioError>;

    /// All counters of a branch, regardless of state.
    async fn list_branch_counters(&self, branch: &BranchId)
    -> Result<Vec<Counter>, TurnioError>;

    /// Counters whose denormalized assignee pointer references the staff
    /// member. More than one result means the exclusivity invariant needs
    /// repair, which the assignment ledger performs by closing all of them.
    async fn list_counters_for_staff(&self, staff: &StaffId)
    -> Result<Vec<Counter>, TurnioError>;

    async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, TurnioError>;

    /// Tickets matching the filter, in no guaranteed order.
    async fn find_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TurnioError>;

    /// Assignment records matching the filter, in no guaranteed order.
    async fn find_assignments(
        &self,
        filter: &AssignmentFilter,
    ) -> Result<Vec<Assignment>, TurnioError>;

    async fn get_staff(&self, id: &StaffId) -> Result<Option<Staff>, TurnioError>;

    /// Applies the changeset as one unit of work.
    async fn commit(&self, changes: Changeset) -> Result<(), TurnioError>;
}
