// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turnio: ticket dispatch and counter allocation for multi-branch customer
//! service queues.
//!
//! This crate re-exports the whole workspace surface and provides
//! [`bootstrap`] to assemble a ready-to-use engine from a configuration and
//! a store.

use std::sync::Arc;

pub use turnio_audit::{verify_chain, ChainError, ChainedEntry, HashChainAudit, GENESIS_HASH};
pub use turnio_bus::{BusNotifier, Envelope, EventBus, QueueEvent, DEFAULT_CAPACITY};
pub use turnio_core::{
    Actor, Assignment, AssignmentFilter, AssignmentId, AuditAction, AuditEntry, AuditSink,
    BranchId, Changeset, Counter, CounterId, CounterStatus, CustomerInfo, Notifier, QueueStore,
    ServiceTypeId, Staff, StaffId, Ticket, TicketFilter, TicketId, TicketStatus, TurnioError,
};
pub use turnio_engine::{
    load_and_validate_str, load_config, load_config_from_path, load_config_from_str,
    register_metrics, CustomerUpdate, DispatchPath, EngineConfig, EventsConfig, QueueEngine,
    TurnioConfig,
};
pub use turnio_store::MemoryStore;

/// A fully wired queue system: the engine plus the event bus and audit chain
/// it publishes to.
pub struct Turnio {
    pub engine: QueueEngine,
    pub bus: EventBus,
    pub audit: Arc<HashChainAudit>,
}

/// Assembles an engine over `store` with an in-process event bus sized from
/// the configuration and a hash-chained audit sink. Metric descriptions are
/// registered as a side effect.
pub fn bootstrap(config: TurnioConfig, store: Arc<dyn QueueStore>) -> Turnio {
    register_metrics();
    let bus = EventBus::new(config.events.channel_capacity);
    let audit = Arc::new(HashChainAudit::new());
    let notifier = Arc::new(BusNotifier::new(bus.clone()));
    let engine = QueueEngine::new(config.engine, store, audit.clone(), notifier);
    Turnio { engine, bus, audit }
}
