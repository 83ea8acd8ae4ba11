// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assignment ledger: who staffs which counter, with full history.
//!
//! Two exclusivity rules hold at all times: a staff member occupies at most
//! one counter, and a counter is occupied by at most one staff member. Every
//! occupancy change closes the records it invalidates and opens the new one
//! in a single commit, so the ledger never shows two active records that
//! contradict each other. The ledger mutex serializes these rewrites; counter
//! locks are then taken in ascending id order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use turnio_core::{
    Actor, Assignment, AssignmentFilter, AuditAction, AuditEntry, AuditSink, BranchId, Changeset,
    CounterId, CounterStatus, Notifier, QueueStore, StaffId, TurnioError,
};

use crate::locks::LockRegistry;
use crate::metrics;

pub struct AssignmentLedger {
    store: Arc<dyn QueueStore>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<LockRegistry>,
}

impl AssignmentLedger {
    pub fn new(
        store: Arc<dyn QueueStore>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<LockRegistry>,
    ) -> Self {
        Self {
            store,
            audit,
            notifier,
            locks,
        }
    }

    /// Assigns a staff member to a counter on a manager's authority. Evicts
    /// the staff member from any other counter and displaces any current
    /// occupant of the target; all closes and the open commit together.
    /// Re-assigning the current occupant is a no-op.
    pub async fn assign(
        &self,
        counter_id: &CounterId,
        staff_id: &StaffId,
        assigned_by: &str,
        notes: Option<&str>,
    ) -> Result<(), TurnioError> {
        if self.store.get_counter(counter_id).await?.is_none() {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        }
        let staff_name = self.store.get_staff(staff_id).await?.map(|s| s.name);
        // The audit actor is the manager doing the assigning, not the staff
        // member being seated. Evictions and displacements below are theirs
        // too.
        let actor = Actor::new(assigned_by, assigned_by);

        let _ledger_guard = self.locks.lock_ledger().await;
        let held = self.store.list_counters_for_staff(staff_id).await?;
        let mut lock_set: Vec<CounterId> = held.iter().map(|c| c.id.clone()).collect();
        lock_set.push(counter_id.clone());
        let _counter_guards = self.locks.lock_counters(&lock_set).await;

        let Some(mut target) = self.store.get_counter(counter_id).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        };
        if target.assigned_staff_id.as_ref() == Some(staff_id) {
            debug!(counter_id = %counter_id, staff_id = %staff_id, "staff already assigned, ignoring");
            return Ok(());
        }

        let now = Utc::now();
        let mut changes = Changeset::new();
        let mut audits: Vec<AuditEntry> = Vec::new();
        let mut vacated: Vec<(BranchId, CounterId)> = Vec::new();
        let mut closed = 0u64;

        // One staff member, one counter: pull them off everywhere else.
        for held_counter in &held {
            if held_counter.id == *counter_id {
                continue;
            }
            let Some(mut other) = self.store.get_counter(&held_counter.id).await? else {
                continue;
            };
            if other.assigned_staff_id.as_ref() != Some(staff_id) {
                continue;
            }
            let note = format!("auto-unassigned: staff reassigned to counter {counter_id}");
            closed += self
                .close_active_records(&mut changes, &other.id, staff_id, assigned_by, &note, now)
                .await?;
            other.assigned_staff_id = None;
            other.status = CounterStatus::Offline;
            audits.push(
                AuditEntry::new(&actor, AuditAction::UnassignCounter, "Counter", &other.id.0)
                    .with_old_value(staff_id.0.clone())
                    .with_details(note),
            );
            vacated.push((other.branch_id.clone(), other.id.clone()));
            changes.update_counter(other);
        }

        // One counter, one staff member: displace the current occupant.
        if let Some(displaced) = target.assigned_staff_id.clone() {
            let note = "auto-unassigned: counter reassigned to another staff member".to_string();
            closed += self
                .close_active_records(&mut changes, counter_id, &displaced, assigned_by, &note, now)
                .await?;
            audits.push(
                AuditEntry::new(&actor, AuditAction::UnassignCounter, "Counter", &counter_id.0)
                    .with_old_value(displaced.0.clone())
                    .with_details(note),
            );
            vacated.push((target.branch_id.clone(), counter_id.clone()));
        }

        let record = Assignment::open(
            counter_id.clone(),
            staff_id.clone(),
            assigned_by,
            notes.map(str::to_string),
            now,
        );
        changes.insert_assignment(record);
        target.assigned_staff_id = Some(staff_id.clone());
        let target_branch = target.branch_id.clone();
        changes.update_counter(target);

        let mut open_entry =
            AuditEntry::new(&actor, AuditAction::AssignCounter, "Counter", &counter_id.0)
                .with_new_value(staff_id.0.clone());
        if let Some(notes) = notes {
            open_entry = open_entry.with_details(notes);
        }
        audits.push(open_entry);

        self.store.commit(changes).await?;
        metrics::record_assignments("opened", 1);
        metrics::record_assignments("closed", closed);
        info!(
            counter_id = %counter_id,
            staff_id = %staff_id,
            assigned_by,
            "staff assigned to counter"
        );

        for entry in audits {
            self.record_audit(entry).await;
        }
        for (branch, counter) in &vacated {
            self.notify_unassigned(branch, counter).await;
        }
        if let Some(name) = &staff_name {
            self.notify_assigned(&target_branch, counter_id, staff_id, name)
                .await;
        }
        Ok(())
    }

    /// A staff member signs in at a counter themselves. Unlike a manager
    /// assignment this refuses an occupied counter, naming the occupant, and
    /// refuses before any record is touched. Signing in where already signed
    /// in is a no-op.
    pub async fn self_assign(
        &self,
        counter_id: &CounterId,
        staff_id: &StaffId,
    ) -> Result<(), TurnioError> {
        if self.store.get_counter(counter_id).await?.is_none() {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        }
        let staff_name = self.store.get_staff(staff_id).await?.map(|s| s.name);
        let actor = Actor {
            id: staff_id.0.clone(),
            name: staff_name.clone().unwrap_or_else(|| "Unknown".to_string()),
        };

        let _ledger_guard = self.locks.lock_ledger().await;
        let held = self.store.list_counters_for_staff(staff_id).await?;
        let mut lock_set: Vec<CounterId> = held.iter().map(|c| c.id.clone()).collect();
        lock_set.push(counter_id.clone());
        let _counter_guards = self.locks.lock_counters(&lock_set).await;

        let Some(mut target) = self.store.get_counter(counter_id).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        };
        if target.assigned_staff_id.as_ref() == Some(staff_id) {
            debug!(counter_id = %counter_id, staff_id = %staff_id, "already signed in, ignoring");
            return Ok(());
        }
        // Occupancy is checked before anything is written; a refused sign-in
        // must not have evicted the staff member from their old counter.
        if let Some(occupant) = target.assigned_staff_id.clone() {
            let occupant_name = self
                .store
                .get_staff(&occupant)
                .await?
                .map(|s| s.name)
                .unwrap_or_else(|| "another staff member".to_string());
            return Err(TurnioError::CounterOccupied {
                counter: counter_id.clone(),
                occupant,
                occupant_name,
            });
        }

        let now = Utc::now();
        let mut changes = Changeset::new();
        let mut audits: Vec<AuditEntry> = Vec::new();
        let mut vacated: Vec<(BranchId, CounterId)> = Vec::new();
        let mut closed = 0u64;

        for held_counter in &held {
            if held_counter.id == *counter_id {
                continue;
            }
            let Some(mut other) = self.store.get_counter(&held_counter.id).await? else {
                continue;
            };
            if other.assigned_staff_id.as_ref() != Some(staff_id) {
                continue;
            }
            let note = format!("auto-unassigned: staff signed in at counter {counter_id}");
            closed += self
                .close_active_records(&mut changes, &other.id, staff_id, &staff_id.0, &note, now)
                .await?;
            other.assigned_staff_id = None;
            other.status = CounterStatus::Offline;
            audits.push(
                AuditEntry::new(&actor, AuditAction::UnassignCounter, "Counter", &other.id.0)
                    .with_old_value(staff_id.0.clone())
                    .with_details(note),
            );
            vacated.push((other.branch_id.clone(), other.id.clone()));
            changes.update_counter(other);
        }

        let record = Assignment::open(counter_id.clone(), staff_id.clone(), "self", None, now);
        changes.insert_assignment(record);
        target.assigned_staff_id = Some(staff_id.clone());
        let target_branch = target.branch_id.clone();
        changes.update_counter(target);
        audits.push(
            AuditEntry::new(&actor, AuditAction::Login, "Counter", &counter_id.0)
                .with_new_value(staff_id.0.clone())
                .with_details("staff signed in at counter"),
        );

        self.store.commit(changes).await?;
        metrics::record_assignments("opened", 1);
        metrics::record_assignments("closed", closed);
        info!(counter_id = %counter_id, staff_id = %staff_id, "staff signed in at counter");

        for entry in audits {
            self.record_audit(entry).await;
        }
        for (branch, counter) in &vacated {
            self.notify_unassigned(branch, counter).await;
        }
        if let Some(name) = &staff_name {
            self.notify_assigned(&target_branch, counter_id, staff_id, name)
                .await;
        }
        Ok(())
    }

    /// Releases a counter: closes every active record for the occupant and
    /// forces the counter offline, since an unstaffed counter cannot keep
    /// serving. A counter with no assignee is left alone.
    pub async fn unassign(
        &self,
        counter_id: &CounterId,
        unassigned_by: &str,
        notes: Option<&str>,
    ) -> Result<(), TurnioError> {
        if self.store.get_counter(counter_id).await?.is_none() {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        }

        let _ledger_guard = self.locks.lock_ledger().await;
        let _counter_guard = self.locks.lock_counter(counter_id).await;
        let Some(mut counter) = self.store.get_counter(counter_id).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        };
        let Some(staff_id) = counter.assigned_staff_id.clone() else {
            debug!(counter_id = %counter_id, "counter has no assignee, ignoring");
            return Ok(());
        };
        let actor = Actor::new(unassigned_by, unassigned_by);

        let now = Utc::now();
        let mut changes = Changeset::new();
        let closed = self
            .close_active_records(
                &mut changes,
                counter_id,
                &staff_id,
                unassigned_by,
                notes.unwrap_or("unassigned"),
                now,
            )
            .await?;
        counter.assigned_staff_id = None;
        counter.status = CounterStatus::Offline;
        let branch = counter.branch_id.clone();
        changes.update_counter(counter);

        self.store.commit(changes).await?;
        metrics::record_assignments("closed", closed);
        info!(
            counter_id = %counter_id,
            staff_id = %staff_id,
            unassigned_by,
            "staff unassigned from counter"
        );

        let mut entry =
            AuditEntry::new(&actor, AuditAction::UnassignCounter, "Counter", &counter_id.0)
                .with_old_value(staff_id.0.clone());
        if let Some(notes) = notes {
            entry = entry.with_details(notes);
        }
        self.record_audit(entry).await;
        self.notify_unassigned(&branch, counter_id).await;
        Ok(())
    }

    /// Occupancy history, most recent first.
    pub async fn history(
        &self,
        filter: &AssignmentFilter,
    ) -> Result<Vec<Assignment>, TurnioError> {
        let mut records = self.store.find_assignments(filter).await?;
        records.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
        Ok(records)
    }

    /// Closes every active record binding `staff_id` to `counter_id`,
    /// queueing the rewrites on `changes`. Returns how many were closed.
    async fn close_active_records(
        &self,
        changes: &mut Changeset,
        counter_id: &CounterId,
        staff_id: &StaffId,
        closed_by: &str,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, TurnioError> {
        let filter = AssignmentFilter::new()
            .at_counter(counter_id.clone())
            .for_staff(staff_id.clone())
            .active_only();
        let records = self.store.find_assignments(&filter).await?;
        let mut closed = 0u64;
        for mut record in records {
            record.close(closed_by, Some(note), now);
            changes.update_assignment(record);
            closed += 1;
        }
        Ok(closed)
    }

    async fn record_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(entry).await {
            warn!(error = %e, "audit write failed (non-fatal)");
        }
    }

    async fn notify_assigned(
        &self,
        branch: &BranchId,
        counter: &CounterId,
        staff: &StaffId,
        staff_name: &str,
    ) {
        if let Err(e) = self
            .notifier
            .counter_assigned(branch, counter, staff, staff_name)
            .await
        {
            warn!(counter_id = %counter, error = %e, "assignment notification failed (non-fatal)");
        }
    }

    async fn notify_unassigned(&self, branch: &BranchId, counter: &CounterId) {
        if let Err(e) = self.notifier.counter_unassigned(branch, counter).await {
            warn!(counter_id = %counter, error = %e, "unassignment notification failed (non-fatal)");
        }
    }
}
