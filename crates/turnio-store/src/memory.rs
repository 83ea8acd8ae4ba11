// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`QueueStore`] with all-or-nothing changeset commits.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use turnio_core::{
    Assignment, AssignmentFilter, AssignmentId, BranchId, Changeset, Counter, CounterId,
    QueueStore, Staff, StaffId, Ticket, TicketFilter, TicketId, TurnioError,
};

#[derive(Debug, Default)]
struct Tables {
    counters: HashMap<CounterId, Counter>,
    tickets: HashMap<TicketId, Ticket>,
    assignments: HashMap<AssignmentId, Assignment>,
    staff: HashMap<StaffId, Staff>,
}

/// In-process store backing tests and single-node deployments.
///
/// A commit validates every row of the changeset against the current tables
/// before touching any of them, so a rejected commit leaves no partial write
/// behind. All tables live under one `RwLock`; readers never observe a
/// half-applied changeset.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    /// Rejects any row the changeset cannot apply cleanly: inserts of ids
    /// that already exist, updates of ids that do not.
    fn validate(&self, changes: &Changeset) -> Result<(), TurnioError> {
        for counter in &changes.insert_counters {
            if self.counters.contains_key(&counter.id) {
                return Err(TurnioError::storage(format!(
                    "insert of existing counter {}",
                    counter.id
                )));
            }
        }
        for counter in &changes.update_counters {
            if !self.counters.contains_key(&counter.id) {
                return Err(TurnioError::storage(format!(
                    "update of unknown counter {}",
                    counter.id
                )));
            }
        }
        for ticket in &changes.insert_tickets {
            if self.tickets.contains_key(&ticket.id) {
                return Err(TurnioError::storage(format!(
                    "insert of existing ticket {}",
                    ticket.id
                )));
            }
        }
        for ticket in &changes.update_tickets {
            if !self.tickets.contains_key(&ticket.id) {
                return Err(TurnioError::storage(format!(
                    "update of unknown ticket {}",
                    ticket.id
                )));
            }
        }
        for assignment in &changes.insert_assignments {
            if self.assignments.contains_key(&assignment.id) {
                return Err(TurnioError::storage(format!(
                    "insert of existing assignment {}",
                    assignment.id
                )));
            }
        }
        for assignment in &changes.update_assignments {
            if !self.assignments.contains_key(&assignment.id) {
                return Err(TurnioError::storage(format!(
                    "update of unknown assignment {}",
                    assignment.id
                )));
            }
        }
        for staff in &changes.insert_staff {
            if self.staff.contains_key(&staff.id) {
                return Err(TurnioError::storage(format!(
                    "insert of existing staff {}",
                    staff.id
                )));
            }
        }
        Ok(())
    }

    fn apply(&mut self, changes: Changeset) {
        for counter in changes.insert_counters {
            self.counters.insert(counter.id.clone(), counter);
        }
        for counter in changes.update_counters {
            self.counters.insert(counter.id.clone(), counter);
        }
        for ticket in changes.insert_tickets {
            self.tickets.insert(ticket.id.clone(), ticket);
        }
        for ticket in changes.update_tickets {
            self.tickets.insert(ticket.id.clone(), ticket);
        }
        for assignment in changes.insert_assignments {
            self.assignments.insert(assignment.id.clone(), assignment);
        }
        for assignment in changes.update_assignments {
            self.assignments.insert(assignment.id.clone(), assignment);
        }
        for staff in changes.insert_staff {
            self.staff.insert(staff.id.clone(), staff);
        }
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn get_counter(&self, id: &CounterId) -> Result<Option<Counter>, TurnioError> {
        Ok(self.inner.read().await.counters.get(id).cloned())
    }

    async fn list_branch_counters(
        &self,
        branch: &BranchId,
    ) -> Result<Vec<Counter>, TurnioError> {
        let tables = self.inner.read().await;
        Ok(tables
            .counters
            .values()
            .filter(|c| c.branch_id == *branch)
            .cloned()
            .collect())
    }

    async fn list_counters_for_staff(
        &self,
        staff: &StaffId,
    ) -> Result<Vec<Counter>, TurnioError> {
        let tables = self.inner.read().await;
        Ok(tables
            .counters
            .values()
            .filter(|c| c.assigned_staff_id.as_ref() == Some(staff))
            .cloned()
            .collect())
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        Ok(self.inner.read().await.tickets.get(id).cloned())
    }

    async fn find_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TurnioError> {
        let tables = self.inner.read().await;
        Ok(tables
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn find_assignments(
        &self,
        filter: &AssignmentFilter,
    ) -> Result<Vec<Assignment>, TurnioError> {
        let tables = self.inner.read().await;
        Ok(tables
            .assignments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn get_staff(&self, id: &StaffId) -> Result<Option<Staff>, TurnioError> {
        Ok(self.inner.read().await.staff.get(id).cloned())
    }

    async fn commit(&self, changes: Changeset) -> Result<(), TurnioError> {
        let mut tables = self.inner.write().await;
        tables.validate(&changes)?;
        trace!(
            counters = changes.insert_counters.len() + changes.update_counters.len(),
            tickets = changes.insert_tickets.len() + changes.update_tickets.len(),
            assignments =
                changes.insert_assignments.len() + changes.update_assignments.len(),
            "changeset committed"
        );
        tables.apply(changes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use turnio_core::{CustomerInfo, ServiceTypeId, TicketStatus};

    use super::*;

    fn counter(id: &str, branch: &str) -> Counter {
        Counter::new(
            CounterId(id.into()),
            BranchId(branch.into()),
            format!("Counter {id}"),
            id.to_uppercase(),
        )
    }

    fn ticket(branch: &str, counter_id: &str) -> Ticket {
        Ticket::new(
            TicketId::new(),
            BranchId(branch.into()),
            ServiceTypeId("general".into()),
            "G0001",
            CounterId(counter_id.into()),
            CustomerInfo::default(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn commit_inserts_and_reads_back() {
        let store = MemoryStore::new();
        let mut changes = Changeset::new();
        changes.insert_counter(counter("c1", "b1"));
        changes.insert_counter(counter("c2", "b1"));
        changes.insert_counter(counter("c3", "b2"));
        store.commit(changes).await.unwrap();

        let found = store.get_counter(&CounterId("c1".into())).await.unwrap();
        assert!(found.is_some());

        let in_branch = store
            .list_branch_counters(&BranchId("b1".into()))
            .await
            .unwrap();
        assert_eq!(in_branch.len(), 2);
    }

    #[tokio::test]
    async fn rejected_commit_applies_nothing() {
        let store = MemoryStore::new();
        let mut seed = Changeset::new();
        seed.insert_counter(counter("c1", "b1"));
        store.commit(seed).await.unwrap();

        // Valid insert bundled with an update of a counter that was never
        // stored: the whole changeset must be rejected.
        let mut bad = Changeset::new();
        bad.insert_ticket(ticket("b1", "c1"));
        bad.update_counter(counter("ghost", "b1"));
        let err = store.commit(bad).await.unwrap_err();
        assert!(matches!(err, TurnioError::Storage { .. }));

        let tickets = store.find_tickets(&TicketFilter::new()).await.unwrap();
        assert!(
            tickets.is_empty(),
            "a rejected commit must not leave partial writes behind"
        );
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        let c = counter("c1", "b1");

        let mut first = Changeset::new();
        first.insert_counter(c.clone());
        store.commit(first).await.unwrap();

        let mut second = Changeset::new();
        second.insert_counter(c);
        assert!(store.commit(second).await.is_err());
    }

    #[tokio::test]
    async fn find_tickets_honors_filter() {
        let store = MemoryStore::new();
        let mut changes = Changeset::new();
        changes.insert_counter(counter("c1", "b1"));
        let waiting = ticket("b1", "c1");
        let mut done = ticket("b1", "c1");
        done.status = TicketStatus::Completed;
        changes.insert_ticket(waiting.clone());
        changes.insert_ticket(done);
        changes.insert_ticket(ticket("b2", "c9"));
        store.commit(changes).await.unwrap();

        let found = store
            .find_tickets(
                &TicketFilter::new()
                    .in_branch(BranchId("b1".into()))
                    .with_status(TicketStatus::Waiting),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, waiting.id);
    }

    #[tokio::test]
    async fn counters_for_staff_follows_assignee_pointer() {
        let store = MemoryStore::new();
        let mut c1 = counter("c1", "b1");
        c1.assigned_staff_id = Some(StaffId("s1".into()));
        let mut changes = Changeset::new();
        changes.insert_counter(c1);
        changes.insert_counter(counter("c2", "b1"));
        changes.insert_staff(Staff::new(StaffId("s1".into()), "Ana"));
        store.commit(changes).await.unwrap();

        let held = store
            .list_counters_for_staff(&StaffId("s1".into()))
            .await
            .unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].id, CounterId("c1".into()));

        let staff = store.get_staff(&StaffId("s1".into())).await.unwrap();
        assert_eq!(staff.map(|s| s.name), Some("Ana".into()));
    }
}
