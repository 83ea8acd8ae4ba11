// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Turnio ticket dispatch and counter allocation engine.
//!
//! This crate provides the domain types, the error taxonomy, and the
//! collaborator trait definitions used throughout the Turnio workspace.
//! Persistence backends, audit sinks, and notification transports all
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TurnioError;
pub use types::{
    Actor, Assignment, AssignmentId, AuditAction, BranchId, Counter, CounterId, CounterStatus,
    CustomerInfo, ServiceTypeId, Staff, StaffId, Ticket, TicketId, TicketStatus,
};

// Re-export the collaborator traits and their contract types.
pub use traits::{
    AssignmentFilter, AuditEntry, AuditSink, Changeset, Notifier, QueueStore, TicketFilter,
};

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn turnio_error_has_all_variants() {
        // Verify all 9 error variants exist and can be constructed.
        let _no_counter = TurnioError::NoAvailableCounter {
            branch: BranchId("b1".into()),
        };
        let _not_found = TurnioError::CounterNotFound {
            counter: CounterId("c1".into()),
        };
        let _occupied = TurnioError::CounterOccupied {
            counter: CounterId("c1".into()),
            occupant: StaffId("s1".into()),
            occupant_name: "Ana".into(),
        };
        let _mismatch = TurnioError::BranchMismatch {
            ticket: TicketId("t1".into()),
            ticket_branch: BranchId("b1".into()),
            counter: CounterId("c9".into()),
            counter_branch: BranchId("b2".into()),
        };
        let _storage = TurnioError::Storage {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _audit = TurnioError::Audit {
            message: "test".into(),
            source: None,
        };
        let _notify = TurnioError::Notify {
            message: "test".into(),
            source: None,
        };
        let _config = TurnioError::Config("test".into());
        let _internal = TurnioError::Internal("test".into());
    }

    #[test]
    fn occupied_error_message_names_the_occupant() {
        let err = TurnioError::CounterOccupied {
            counter: CounterId("c3".into()),
            occupant: StaffId("s7".into()),
            occupant_name: "Marta".into(),
        };
        let message = err.to_string();
        assert!(message.contains("c3"), "message should name the counter: {message}");
        assert!(message.contains("Marta"), "message should name the occupant: {message}");
    }

    #[test]
    fn status_enums_round_trip_display_and_parse() {
        use std::str::FromStr;

        let ticket_statuses = [
            TicketStatus::Waiting,
            TicketStatus::Called,
            TicketStatus::Serving,
            TicketStatus::Completed,
            TicketStatus::Missed,
            TicketStatus::Cancelled,
        ];
        for status in &ticket_statuses {
            let s = status.to_string();
            let parsed = TicketStatus::from_str(&s).expect("should parse back");
            assert_eq!(*status, parsed);
        }

        let counter_statuses = [
            CounterStatus::Offline,
            CounterStatus::Online,
            CounterStatus::Break,
        ];
        for status in &counter_statuses {
            let s = status.to_string();
            let parsed = CounterStatus::from_str(&s).expect("should parse back");
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn audit_action_serialization() {
        let action = AuditAction::AssignCounter;
        let json = serde_json::to_string(&action).expect("should serialize");
        let parsed: AuditAction = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(action, parsed);
    }

    #[test]
    fn minted_ids_are_unique() {
        let a = TicketId::new();
        let b = TicketId::new();
        assert_ne!(a, b, "two minted ticket ids must differ");

        let a = AssignmentId::new();
        let b = AssignmentId::new();
        assert_ne!(a, b, "two minted assignment ids must differ");
    }

    #[test]
    fn new_counter_starts_enabled_offline_and_unstaffed() {
        let counter = Counter::new(
            CounterId("c1".into()),
            BranchId("b1".into()),
            "Counter 1",
            "C1",
        );
        assert!(counter.is_active);
        assert_eq!(counter.status, CounterStatus::Offline);
        assert!(counter.assigned_staff_id.is_none());
        assert!(counter.current_ticket_id.is_none());
        assert_eq!(counter.daily_sequence, 0);
        assert_eq!(counter.last_reset_date, Utc::now().date_naive());
    }

    #[test]
    fn new_ticket_is_waiting_and_routed() {
        let now = Utc::now();
        let ticket = Ticket::new(
            TicketId::new(),
            BranchId("b1".into()),
            ServiceTypeId("deposits".into()),
            "C10001",
            CounterId("c1".into()),
            CustomerInfo::default(),
            now,
        );
        assert_eq!(ticket.status, TicketStatus::Waiting);
        assert_eq!(ticket.counter_id, Some(CounterId("c1".into())));
        assert_eq!(ticket.created_at, now);
        assert_eq!(ticket.updated_at, now);
        assert!(ticket.called_at.is_none());
        assert!(!ticket.is_in_service());
    }

    #[test]
    fn assignment_close_stamps_and_appends_note() {
        let opened = Utc::now();
        let mut assignment = Assignment::open(
            CounterId("c1".into()),
            StaffId("s1".into()),
            "tm-1",
            Some("opening note".into()),
            opened,
        );
        assert!(assignment.is_active);
        assert!(assignment.unassigned_at.is_none());

        let closed = opened + Duration::minutes(5);
        assignment.close("tm-2", Some("shift over"), closed);
        assert!(!assignment.is_active);
        assert_eq!(assignment.unassigned_at, Some(closed));
        assert_eq!(assignment.unassigned_by.as_deref(), Some("tm-2"));
        assert_eq!(
            assignment.notes.as_deref(),
            Some("opening note; shift over"),
            "close note should append to the opening note"
        );
    }

    #[test]
    fn ticket_filter_matches_on_all_populated_fields() {
        let now = Utc::now();
        let ticket = Ticket::new(
            TicketId::new(),
            BranchId("b1".into()),
            ServiceTypeId("loans".into()),
            "L0001",
            CounterId("c2".into()),
            CustomerInfo::default(),
            now,
        );

        let hit = TicketFilter::new()
            .in_branch(BranchId("b1".into()))
            .at_counter(CounterId("c2".into()))
            .with_status(TicketStatus::Waiting);
        assert!(hit.matches(&ticket));

        let wrong_branch = TicketFilter::new().in_branch(BranchId("b2".into()));
        assert!(!wrong_branch.matches(&ticket));

        let wrong_status = TicketFilter::new().with_status(TicketStatus::Completed);
        assert!(!wrong_status.matches(&ticket));

        let too_late = TicketFilter::new().created_from(now + Duration::seconds(1));
        assert!(!too_late.matches(&ticket));

        let window = TicketFilter::new()
            .created_from(now - Duration::seconds(1))
            .created_to(now + Duration::seconds(1));
        assert!(window.matches(&ticket));
    }

    #[test]
    fn assignment_filter_active_only_excludes_closed_records() {
        let now = Utc::now();
        let mut assignment = Assignment::open(
            CounterId("c1".into()),
            StaffId("s1".into()),
            "tm-1",
            None,
            now,
        );

        let filter = AssignmentFilter::new()
            .for_staff(StaffId("s1".into()))
            .active_only();
        assert!(filter.matches(&assignment));

        assignment.close("tm-1", None, now);
        assert!(!filter.matches(&assignment));
    }

    #[test]
    fn changeset_tracks_emptiness() {
        let mut changes = Changeset::new();
        assert!(changes.is_empty());

        changes.insert_staff(Staff::new(StaffId("s1".into()), "Ana"));
        assert!(!changes.is_empty());
    }
}
