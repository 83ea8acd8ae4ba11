// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The assembled engine: one façade over issuance, dispatch, lifecycle,
//! assignment, and the counter registry, all sharing one store, one audit
//! sink, one notifier, and one lock table.

use std::sync::Arc;

use chrono::NaiveDate;
use turnio_core::{
    Actor, Assignment, AssignmentFilter, AuditSink, BranchId, Counter, CounterId, CounterStatus,
    CustomerInfo, Notifier, QueueStore, ServiceTypeId, Staff, StaffId, Ticket, TicketId,
    TurnioError,
};

use crate::assignment::AssignmentLedger;
use crate::config::EngineConfig;
use crate::dispatch::CallDispatcher;
use crate::issuer::TicketIssuer;
use crate::lifecycle::{CustomerUpdate, LifecycleController};
use crate::locks::LockRegistry;
use crate::registry::CounterRegistry;

pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    registry: CounterRegistry,
    issuer: TicketIssuer,
    dispatcher: CallDispatcher,
    lifecycle: LifecycleController,
    ledger: AssignmentLedger,
}

impl QueueEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn QueueStore>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let locks = Arc::new(LockRegistry::new());
        Self {
            registry: CounterRegistry::new(
                store.clone(),
                audit.clone(),
                notifier.clone(),
                locks.clone(),
            ),
            issuer: TicketIssuer::new(
                config.clone(),
                store.clone(),
                notifier.clone(),
                locks.clone(),
            ),
            dispatcher: CallDispatcher::new(
                config,
                store.clone(),
                notifier.clone(),
                locks.clone(),
            ),
            lifecycle: LifecycleController::new(
                store.clone(),
                audit.clone(),
                notifier.clone(),
                locks.clone(),
            ),
            ledger: AssignmentLedger::new(store.clone(), audit, notifier, locks),
            store,
        }
    }

    // Issuance.

    pub async fn issue_ticket(
        &self,
        branch: BranchId,
        service_type: ServiceTypeId,
        customer: CustomerInfo,
    ) -> Result<Ticket, TurnioError> {
        self.issuer.issue(branch, service_type, customer).await
    }

    // Dispatch.

    pub async fn call_next(
        &self,
        counter: &CounterId,
        staff: Option<StaffId>,
    ) -> Result<Option<Ticket>, TurnioError> {
        self.dispatcher.call_next(counter, staff).await
    }

    // Lifecycle.

    pub async fn recall(&self, ticket: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        self.lifecycle.recall(ticket).await
    }

    pub async fn complete(&self, ticket: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        self.lifecycle.complete(ticket).await
    }

    pub async fn miss(&self, ticket: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        self.lifecycle.miss(ticket).await
    }

    pub async fn transfer(
        &self,
        ticket: &TicketId,
        target: &CounterId,
        note: Option<&str>,
    ) -> Result<Option<Ticket>, TurnioError> {
        self.lifecycle.transfer(ticket, target, note).await
    }

    pub async fn update_customer_info(
        &self,
        ticket: &TicketId,
        update: CustomerUpdate,
    ) -> Result<Option<Ticket>, TurnioError> {
        self.lifecycle.update_customer_info(ticket, update).await
    }

    // Queue queries.

    pub async fn ticket(&self, ticket: &TicketId) -> Result<Option<Ticket>, TurnioError> {
        self.lifecycle.ticket(ticket).await
    }

    pub async fn waiting_tickets(
        &self,
        branch: &BranchId,
        counter: &CounterId,
    ) -> Result<Vec<Ticket>, TurnioError> {
        self.lifecycle.waiting_tickets(branch, counter).await
    }

    pub async fn active_tickets(&self, counter: &CounterId) -> Result<Vec<Ticket>, TurnioError> {
        self.lifecycle.active_tickets(counter).await
    }

    pub async fn counter_history(&self, counter: &CounterId) -> Result<Vec<Ticket>, TurnioError> {
        self.lifecycle.counter_history(counter).await
    }

    pub async fn tickets_by_filters(
        &self,
        branch: &BranchId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        counter: Option<CounterId>,
    ) -> Result<Vec<Ticket>, TurnioError> {
        self.lifecycle
            .tickets_by_filters(branch, from, to, counter)
            .await
    }

    pub async fn queue_depth(&self, branch: &BranchId) -> Result<usize, TurnioError> {
        self.lifecycle.queue_depth(branch).await
    }

    pub async fn queue_depth_for_counter(
        &self,
        counter: &CounterId,
    ) -> Result<usize, TurnioError> {
        self.lifecycle.queue_depth_for_counter(counter).await
    }

    // Assignment.

    pub async fn assign_staff(
        &self,
        counter: &CounterId,
        staff: &StaffId,
        assigned_by: &str,
        notes: Option<&str>,
    ) -> Result<(), TurnioError> {
        self.ledger.assign(counter, staff, assigned_by, notes).await
    }

    pub async fn self_assign_staff(
        &self,
        counter: &CounterId,
        staff: &StaffId,
    ) -> Result<(), TurnioError> {
        self.ledger.self_assign(counter, staff).await
    }

    pub async fn unassign_staff(
        &self,
        counter: &CounterId,
        unassigned_by: &str,
        notes: Option<&str>,
    ) -> Result<(), TurnioError> {
        self.ledger.unassign(counter, unassigned_by, notes).await
    }

    pub async fn assignment_history(
        &self,
        filter: &AssignmentFilter,
    ) -> Result<Vec<Assignment>, TurnioError> {
        self.ledger.history(filter).await
    }

    // Counter registry.

    pub async fn counter(&self, counter: &CounterId) -> Result<Option<Counter>, TurnioError> {
        self.registry.counter(counter).await
    }

    pub async fn branch_counters(&self, branch: &BranchId) -> Result<Vec<Counter>, TurnioError> {
        self.registry.branch_counters(branch).await
    }

    pub async fn set_counter_status(
        &self,
        counter: &CounterId,
        status: CounterStatus,
        actor: &Actor,
    ) -> Result<Counter, TurnioError> {
        self.registry.set_status(counter, status, actor).await
    }

    pub async fn set_counter_enabled(
        &self,
        counter: &CounterId,
        enabled: bool,
    ) -> Result<Counter, TurnioError> {
        self.registry.set_enabled(counter, enabled).await
    }

    pub async fn staff(&self, staff: &StaffId) -> Result<Option<Staff>, TurnioError> {
        self.store.get_staff(staff).await
    }

    /// The shared store, for callers that need raw reads.
    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }
}
