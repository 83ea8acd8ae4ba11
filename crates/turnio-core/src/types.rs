// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Turnio queue engine and its collaborators.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a branch (a physical service location).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchId(pub String);

/// Identifier of a service counter within a branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterId(pub String);

/// Identifier of a queue ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(pub String);

/// Identifier of a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(pub String);

/// Identifier of a staff-to-counter assignment record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

/// Identifier of a service type (the kind of service a ticket is drawn for).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceTypeId(pub String);

impl TicketId {
    /// Mints a fresh ticket identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentId {
    /// Mints a fresh assignment identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for ServiceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a ticket.
///
/// `Serving` is part of the vocabulary but is never stored by the engine;
/// `start_service_time`/`end_service_time` carry the service phase instead.
/// `Cancelled` likewise has no engine transition and exists for embedding
/// services that cancel tickets out of band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum TicketStatus {
    Waiting,
    Called,
    Serving,
    Completed,
    Missed,
    Cancelled,
}

/// Operational state of a counter. Only `Offline`/`Online` carry allocation
/// semantics; `Break` behaves like `Offline` for dispatch purposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum CounterStatus {
    Offline,
    Online,
    Break,
}

/// Action vocabulary for audit entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    AssignCounter,
    UnassignCounter,
    TransferCounter,
}

/// The acting principal recorded on audited operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The system principal used for automated transitions.
    pub fn system() -> Self {
        Self::new("system", "System")
    }
}

/// A service counter: the unit tickets are routed to and called from.
///
/// The counter owns its `daily_sequence`, `assigned_staff_id`, and
/// `current_ticket_id` fields; nothing mutates them outside the per-counter
/// critical section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub id: CounterId,
    pub branch_id: BranchId,
    pub name: String,
    /// Prefix stamped onto minted ticket numbers, e.g. `"C1"`.
    pub prefix: String,
    /// Whether the counter participates in ticket routing at all.
    pub is_active: bool,
    pub status: CounterStatus,
    /// Denormalized pointer to the active assignee; authoritative state is
    /// the active `Assignment` record.
    pub assigned_staff_id: Option<StaffId>,
    /// The ticket presently called or served at this counter.
    pub current_ticket_id: Option<TicketId>,
    /// Monotonic within a UTC calendar day; resets on first touch of a new day.
    pub daily_sequence: u32,
    pub last_reset_date: NaiveDate,
}

impl Counter {
    /// Creates a routable counter in its initial state: enabled, offline,
    /// unstaffed, sequence at zero as of today.
    pub fn new(
        id: CounterId,
        branch_id: BranchId,
        name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            id,
            branch_id,
            name: name.into(),
            prefix: prefix.into(),
            is_active: true,
            status: CounterStatus::Offline,
            assigned_staff_id: None,
            current_ticket_id: None,
            daily_sequence: 0,
            last_reset_date: Utc::now().date_naive(),
        }
    }
}

/// Customer-supplied metadata carried on a ticket. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub language: Option<String>,
    pub notes: Option<String>,
    pub remarks: Option<String>,
}

/// A customer's place in line for a service type.
///
/// `counter_id` is advisory routing, not a hard binding: the dispatcher may
/// re-point it when rescuing a ticket stranded behind an offline counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub branch_id: BranchId,
    pub service_type_id: ServiceTypeId,
    /// Formatted number, unique per (counter, day) only.
    pub ticket_number: String,
    pub counter_id: Option<CounterId>,
    /// Set when the ticket is called, cleared again on transfer.
    pub staff_id: Option<StaffId>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub start_service_time: Option<DateTime<Utc>>,
    pub end_service_time: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub customer: CustomerInfo,
}

impl Ticket {
    /// Creates a freshly issued ticket in `Waiting` state, pre-routed to the
    /// given counter.
    pub fn new(
        id: TicketId,
        branch_id: BranchId,
        service_type_id: ServiceTypeId,
        ticket_number: impl Into<String>,
        counter_id: CounterId,
        customer: CustomerInfo,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            branch_id,
            service_type_id,
            ticket_number: ticket_number.into(),
            counter_id: Some(counter_id),
            staff_id: None,
            status: TicketStatus::Waiting,
            created_at: now,
            updated_at: now,
            called_at: None,
            start_service_time: None,
            end_service_time: None,
            completed_at: None,
            customer,
        }
    }

    /// Whether the ticket currently occupies a counter (called or in service).
    pub fn is_in_service(&self) -> bool {
        matches!(self.status, TicketStatus::Called | TicketStatus::Serving)
    }
}

/// Append-only record of one staff-to-counter occupancy interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub counter_id: CounterId,
    pub staff_id: StaffId,
    pub assigned_at: DateTime<Utc>,
    pub unassigned_at: Option<DateTime<Utc>>,
    /// Actor identifier that opened the record ("self" logins included).
    pub assigned_by: String,
    pub unassigned_by: Option<String>,
    pub notes: Option<String>,
    /// Exactly one active record may exist per counter, and one per staff.
    pub is_active: bool,
}

impl Assignment {
    /// Opens a new active occupancy record.
    pub fn open(
        counter_id: CounterId,
        staff_id: StaffId,
        assigned_by: impl Into<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            counter_id,
            staff_id,
            assigned_at: now,
            unassigned_at: None,
            assigned_by: assigned_by.into(),
            unassigned_by: None,
            notes,
            is_active: true,
        }
    }

    /// Closes the record, stamping who ended it and why. A close note is
    /// appended to any note the record already carried.
    pub fn close(&mut self, unassigned_by: &str, note: Option<&str>, now: DateTime<Utc>) {
        self.is_active = false;
        self.unassigned_at = Some(now);
        self.unassigned_by = Some(unassigned_by.to_string());
        if let Some(note) = note {
            self.notes = match self.notes.take() {
                Some(existing) => Some(format!("{existing}; {note}")),
                None => Some(note.to_string()),
            };
        }
    }
}

/// A staff member, as far as this engine needs to know one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
}

impl Staff {
    pub fn new(id: StaffId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
