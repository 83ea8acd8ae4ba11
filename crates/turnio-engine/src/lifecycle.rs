// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket lifecycle transitions and queue queries.
//!
//! All update-style operations treat an unknown ticket id as a stale request
//! and return `None` rather than failing; the callers are kiosks and staff
//! consoles that routinely race each other on the same ticket. Audit and
//! notification failures are logged and swallowed so a flaky sink can never
//! wedge a branch queue.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use turnio_core::{
    Actor, AuditAction, AuditEntry, AuditSink, BranchId, Changeset, CounterId, Notifier,
    QueueStore, Ticket, TicketFilter, TicketId, TicketStatus, TurnioError,
};

use crate::locks::LockRegistry;
use crate::metrics;

/// Patch for the customer fields of a ticket. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub remarks: Option<String>,
}

pub struct LifecycleController {
    store: Arc<dyn QueueStore>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<LockRegistry>,
}

impl LifecycleController {
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

    /// Re-announces a ticket by stamping a fresh `called_at`. Status is left
    /// untouched, so a recall never revives a completed or missed ticket.
    pub async fn recall(&self, id: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        let Some(probe) = self.store.get_ticket(id).await? else {
            debug!(ticket_id = %id, "recall for unknown ticket ignored");
            return Ok(None);
        };
        let _branch_guard = self.locks.lock_branch(&probe.branch_id).await;
        let Some(mut ticket) = self.store.get_ticket(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        ticket.called_at = Some(now);
        ticket.updated_at = now;

        let mut changes = Changeset::new();
        changes.update_ticket(ticket.clone());
        self.store.commit(changes).await?;

        info!(ticket_id = %ticket.id, ticket_number = %ticket.ticket_number, "ticket recalled");
        if let Some(counter_id) = &ticket.counter_id {
            self.notify_ticket(&ticket.branch_id, counter_id).await;
        }
        Ok(Some(ticket))
    }

    /// Finishes service. Stamps the completion timestamps and releases the
    /// counter's current-ticket pointer when it still refers to this ticket.
    /// Completing an already-completed ticket changes nothing.
    pub async fn complete(&self, id: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        let Some(probe) = self.store.get_ticket(id).await? else {
            debug!(ticket_id = %id, "complete for unknown ticket ignored");
            return Ok(None);
        };
        let _branch_guard = self.locks.lock_branch(&probe.branch_id).await;
        let Some(mut ticket) = self.store.get_ticket(id).await? else {
            return Ok(None);
        };
        if ticket.status == TicketStatus::Completed {
            debug!(ticket_id = %id, "ticket already completed, ignoring");
            return Ok(None);
        }

        let now = Utc::now();
        ticket.status = TicketStatus::Completed;
        ticket.completed_at = Some(now);
        ticket.end_service_time = Some(now);
        ticket.updated_at = now;

        let mut changes = Changeset::new();
        changes.update_ticket(ticket.clone());

        let mut _counter_guard = None;
        if let Some(counter_id) = &ticket.counter_id {
            _counter_guard = Some(self.locks.lock_counter(counter_id).await);
            if let Some(mut counter) = self.store.get_counter(counter_id).await? {
                // A newer call may already own the pointer.
                if counter.current_ticket_id.as_ref() == Some(&ticket.id) {
                    counter.current_ticket_id = None;
                    changes.update_counter(counter);
                }
            }
        }
        self.store.commit(changes).await?;

        metrics::record_completed();
        info!(ticket_id = %ticket.id, ticket_number = %ticket.ticket_number, "ticket completed");
        if let Some(counter_id) = &ticket.counter_id {
            self.notify_ticket(&ticket.branch_id, counter_id).await;
            self.notify_counter(counter_id).await;
        }
        Ok(Some(ticket))
    }

    /// Marks a called ticket as not showing up. The ticket keeps its counter
    /// pointer for history; the counter keeps its current-ticket pointer so
    /// the console still shows who was called last.
    pub async fn miss(&self, id: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        let Some(probe) = self.store.get_ticket(id).await? else {
            debug!(ticket_id = %id, "miss for unknown ticket ignored");
            return Ok(None);
        };
        let _branch_guard = self.locks.lock_branch(&probe.branch_id).await;
        let Some(mut ticket) = self.store.get_ticket(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        ticket.status = TicketStatus::Missed;
        ticket.updated_at = now;

        let mut changes = Changeset::new();
        changes.update_ticket(ticket.clone());
        self.store.commit(changes).await?;

        metrics::record_missed();
        info!(ticket_id = %ticket.id, ticket_number = %ticket.ticket_number, "ticket missed");
        if let Some(counter_id) = &ticket.counter_id {
            self.notify_ticket(&ticket.branch_id, counter_id).await;
        }
        Ok(Some(ticket))
    }

    /// Moves a ticket to another counter in the same branch and puts it back
    /// in line as `Waiting`. Any staff stamp from a previous call is dropped;
    /// the receiving counter's staff will stamp it on their next call.
    pub async fn transfer(
        &self,
        id: &TicketId,
        target: &CounterId,
        note: Option<&str>,
    ) -> Result<Option<Ticket>, TurnioError> {
        let Some(probe) = self.store.get_ticket(id).await? else {
            debug!(ticket_id = %id, "transfer for unknown ticket ignored");
            return Ok(None);
        };
        let Some(target_counter) = self.store.get_counter(target).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: target.clone(),
            });
        };
        if target_counter.branch_id != probe.branch_id {
            return Err(TurnioError::BranchMismatch {
                ticket: id.clone(),
                ticket_branch: probe.branch_id,
                counter: target.clone(),
                counter_branch: target_counter.branch_id,
            });
        }

        let _branch_guard = self.locks.lock_branch(&probe.branch_id).await;
        let Some(mut ticket) = self.store.get_ticket(id).await? else {
            return Ok(None);
        };

        let vacated = ticket.counter_id.clone();
        let now = Utc::now();
        ticket.counter_id = Some(target.clone());
        ticket.status = TicketStatus::Waiting;
        ticket.staff_id = None;
        ticket.updated_at = now;

        let mut changes = Changeset::new();
        changes.update_ticket(ticket.clone());

        let mut _vacated_guard = None;
        if let Some(old_id) = vacated.as_ref().filter(|old| *old != target) {
            _vacated_guard = Some(self.locks.lock_counter(old_id).await);
            if let Some(mut old_counter) = self.store.get_counter(old_id).await? {
                if old_counter.current_ticket_id.as_ref() == Some(&ticket.id) {
                    old_counter.current_ticket_id = None;
                    changes.update_counter(old_counter);
                }
            }
        }
        self.store.commit(changes).await?;

        metrics::record_transferred();
        info!(
            ticket_id = %ticket.id,
            ticket_number = %ticket.ticket_number,
            to_counter = %target,
            "ticket transferred"
        );

        let mut entry = AuditEntry::new(
            &Actor::system(),
            AuditAction::TransferCounter,
            "Ticket",
            &id.0,
        )
        .with_new_value(target.0.clone());
        if let Some(old_id) = &vacated {
            entry = entry.with_old_value(old_id.0.clone());
        }
        if let Some(note) = note {
            entry = entry.with_details(note);
        }
        self.record_audit(entry).await;

        if let Some(old_id) = vacated.as_ref().filter(|old| *old != target) {
            self.notify_ticket(&ticket.branch_id, old_id).await;
        }
        self.notify_ticket(&ticket.branch_id, target).await;
        Ok(Some(ticket))
    }

    /// Patches the customer contact fields. No notification goes out; the
    /// queue position and status are unaffected.
    pub async fn update_customer_info(
        &self,
        id: &TicketId,
        update: CustomerUpdate,
    ) -> Result<Option<Ticket>, TurnioError> {
        let Some(probe) = self.store.get_ticket(id).await? else {
            debug!(ticket_id = %id, "customer update for unknown ticket ignored");
            return Ok(None);
        };
        let _branch_guard = self.locks.lock_branch(&probe.branch_id).await;
        let Some(mut ticket) = self.store.get_ticket(id).await? else {
            return Ok(None);
        };

        if let Some(phone) = update.phone {
            ticket.customer.phone = Some(phone);
        }
        if let Some(email) = update.email {
            ticket.customer.email = Some(email);
        }
        if let Some(notes) = update.notes {
            ticket.customer.notes = Some(notes);
        }
        if let Some(remarks) = update.remarks {
            ticket.customer.remarks = Some(remarks);
        }
        ticket.updated_at = Utc::now();

        let mut changes = Changeset::new();
        changes.update_ticket(ticket.clone());
        self.store.commit(changes).await?;
        Ok(Some(ticket))
    }

    pub async fn ticket(&self, id: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        self.store.get_ticket(id).await
    }

    /// Waiting tickets for a counter's direct queue, oldest first.
    pub async fn waiting_tickets(
        &self,
        branch: &BranchId,
        counter: &CounterId,
    ) -> Result<Vec<Ticket>, TurnioError> {
        let mut tickets = self
            .store
            .find_tickets(
                &TicketFilter::new()
                    .in_branch(branch.clone())
                    .at_counter(counter.clone())
                    .with_status(TicketStatus::Waiting),
            )
            .await?;
        sort_fifo(&mut tickets);
        Ok(tickets)
    }

    /// Tickets currently in service at a counter, in call order.
    pub async fn active_tickets(&self, counter: &CounterId) -> Result<Vec<Ticket>, TurnioError> {
        let mut tickets = self
            .store
            .find_tickets(
                &TicketFilter::new()
                    .at_counter(counter.clone())
                    .with_status(TicketStatus::Called)
                    .with_status(TicketStatus::Serving),
            )
            .await?;
        tickets.sort_by(|a, b| a.called_at.cmp(&b.called_at));
        Ok(tickets)
    }

    /// Finished business at a counter, most recent first.
    pub async fn counter_history(&self, counter: &CounterId) -> Result<Vec<Ticket>, TurnioError> {
        let mut tickets = self
            .store
            .find_tickets(
                &TicketFilter::new()
                    .at_counter(counter.clone())
                    .with_status(TicketStatus::Completed)
                    .with_status(TicketStatus::Missed),
            )
            .await?;
        tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tickets)
    }

    /// Branch tickets filtered by calendar day and counter, newest first.
    /// The `to` date is inclusive of its whole day.
    pub async fn tickets_by_filters(
        &self,
        branch: &BranchId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        counter: Option<CounterId>,
    ) -> Result<Vec<Ticket>, TurnioError> {
        let mut filter = TicketFilter::new().in_branch(branch.clone());
        if let Some(from) = from {
            filter = filter.created_from(day_start(from));
        }
        if let Some(to) = to {
            // The filter bound is inclusive, so stop just short of midnight.
            filter = filter.created_to(day_start(to) + Duration::days(1) - Duration::nanoseconds(1));
        }
        if let Some(counter) = counter {
            filter = filter.at_counter(counter);
        }
        let mut tickets = self.store.find_tickets(&filter).await?;
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    /// Waiting tickets across the whole branch.
    pub async fn queue_depth(&self, branch: &BranchId) -> Result<usize, TurnioError> {
        let waiting = self
            .store
            .find_tickets(
                &TicketFilter::new()
                    .in_branch(branch.clone())
                    .with_status(TicketStatus::Waiting),
            )
            .await?;
        metrics::set_queue_depth(branch, waiting.len() as f64);
        Ok(waiting.len())
    }

    /// Waiting tickets routed to one counter.
    pub async fn queue_depth_for_counter(
        &self,
        counter: &CounterId,
    ) -> Result<usize, TurnioError> {
        let waiting = self
            .store
            .find_tickets(
                &TicketFilter::new()
                    .at_counter(counter.clone())
                    .with_status(TicketStatus::Waiting),
            )
            .await?;
        Ok(waiting.len())
    }

    async fn notify_ticket(&self, branch: &BranchId, counter: &CounterId) {
        if let Err(e) = self.notifier.ticket_updated(branch, counter).await {
            warn!(counter_id = %counter, error = %e, "ticket notification failed (non-fatal)");
        }
    }

    async fn notify_counter(&self, counter: &CounterId) {
        if let Err(e) = self.notifier.counter_updated(counter).await {
            warn!(counter_id = %counter, error = %e, "counter notification failed (non-fatal)");
        }
    }

    async fn record_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.record(entry).await {
            warn!(error = %e, "audit write failed (non-fatal)");
        }
    }
}

fn sort_fifo(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
