// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end queue testing.
//!
//! `QueueHarness` assembles a complete engine over an in-memory store, a
//! hash-chained audit sink, and a real event bus, with the store, sink, and
//! bus all exposed for assertions.

use std::sync::Arc;

use turnio_audit::HashChainAudit;
use turnio_bus::{BusNotifier, EventBus};
use turnio_core::{
    Actor, BranchId, Changeset, Counter, CounterId, CounterStatus, QueueStore, Staff, StaffId,
    TurnioError,
};
use turnio_engine::{EngineConfig, QueueEngine};
use turnio_store::MemoryStore;

/// Builder for queue test environments.
pub struct QueueHarnessBuilder {
    branch: BranchId,
    counters: Vec<(String, String)>,
    staff: Vec<(String, String)>,
    config: EngineConfig,
    bus_capacity: usize,
}

impl QueueHarnessBuilder {
    fn new() -> Self {
        Self {
            branch: BranchId("b1".into()),
            counters: Vec::new(),
            staff: Vec::new(),
            config: EngineConfig::default(),
            bus_capacity: 64,
        }
    }

    /// Use a branch id other than the default `b1`.
    pub fn with_branch(mut self, id: &str) -> Self {
        self.branch = BranchId(id.into());
        self
    }

    /// Seed a counter (enabled, offline, unstaffed) with a ticket prefix.
    pub fn with_counter(mut self, id: &str, prefix: &str) -> Self {
        self.counters.push((id.to_string(), prefix.to_string()));
        self
    }

    /// Seed a staff member.
    pub fn with_staff(mut self, id: &str, name: &str) -> Self {
        self.staff.push((id.to_string(), name.to_string()));
        self
    }

    /// Override the engine policy configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the harness, seeding the store and wiring the engine.
    pub async fn build(self) -> Result<QueueHarness, TurnioError> {
        let store = Arc::new(MemoryStore::new());
        let mut changes = Changeset::new();
        for (id, prefix) in &self.counters {
            changes.insert_counter(Counter::new(
                CounterId(id.clone()),
                self.branch.clone(),
                format!("Counter {id}"),
                prefix.clone(),
            ));
        }
        for (id, name) in &self.staff {
            changes.insert_staff(Staff::new(StaffId(id.clone()), name.clone()));
        }
        if !changes.is_empty() {
            store.commit(changes).await?;
        }

        let audit = Arc::new(HashChainAudit::new());
        let bus = EventBus::new(self.bus_capacity);
        let notifier = Arc::new(BusNotifier::new(bus.clone()));
        let engine = QueueEngine::new(self.config, store.clone(), audit.clone(), notifier);

        Ok(QueueHarness {
            engine,
            store,
            audit,
            bus,
            branch: self.branch,
        })
    }
}

/// A complete queue environment for integration tests.
pub struct QueueHarness {
    pub engine: QueueEngine,
    pub store: Arc<MemoryStore>,
    pub audit: Arc<HashChainAudit>,
    pub bus: EventBus,
    pub branch: BranchId,
}

impl QueueHarness {
    pub fn builder() -> QueueHarnessBuilder {
        QueueHarnessBuilder::new()
    }

    /// Staffs a counter and brings it online, the way a teller starts a
    /// shift: sign in, then flip the console to online.
    pub async fn open_counter(&self, counter: &str, staff: &str) -> Result<(), TurnioError> {
        let counter_id = CounterId(counter.into());
        self.engine
            .assign_staff(&counter_id, &StaffId(staff.into()), "harness", None)
            .await?;
        self.engine
            .set_counter_status(&counter_id, CounterStatus::Online, &Actor::system())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_seeds_counters_and_staff() {
        let harness = QueueHarness::builder()
            .with_counter("c1", "A")
            .with_counter("c2", "B")
            .with_staff("s1", "Asha")
            .build()
            .await
            .unwrap();

        let counters = harness
            .store
            .list_branch_counters(&harness.branch)
            .await
            .unwrap();
        assert_eq!(counters.len(), 2);
        assert!(harness
            .store
            .get_staff(&StaffId("s1".into()))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn open_counter_staffs_and_goes_online() {
        let harness = QueueHarness::builder()
            .with_counter("c1", "A")
            .with_staff("s1", "Asha")
            .build()
            .await
            .unwrap();

        harness.open_counter("c1", "s1").await.unwrap();

        let counter = harness
            .store
            .get_counter(&CounterId("c1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.status, CounterStatus::Online);
        assert_eq!(counter.assigned_staff_id, Some(StaffId("s1".into())));
    }
}
