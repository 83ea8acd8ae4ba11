// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter registry: lookups and operator-driven state changes.
//!
//! The registry never touches tickets or assignment records. Status and
//! enablement writes take only the counter critical section, so they can
//! interleave with issuance; the issuer re-reads under the counter lock
//! before committing against a toggled counter.

use std::sync::Arc;

use tracing::{info, warn};
use turnio_core::{
    Actor, AuditAction, AuditEntry, AuditSink, BranchId, Changeset, Counter, CounterId,
    CounterStatus, Notifier, QueueStore, TurnioError,
};

use crate::locks::LockRegistry;

pub struct CounterRegistry {
    store: Arc<dyn QueueStore>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<LockRegistry>,
}

impl CounterRegistry {
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

    pub async fn counter(&self, id: &CounterId) -> Result<Option<Counter>, TurnioError> {
        self.store.get_counter(id).await
    }

    /// All counters of a branch, in stable id order.
    pub async fn branch_counters(&self, branch: &BranchId) -> Result<Vec<Counter>, TurnioError> {
        let mut counters = self.store.list_branch_counters(branch).await?;
        counters.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(counters)
    }

    /// Sets the operational status and records who changed it.
    pub async fn set_status(
        &self,
        id: &CounterId,
        status: CounterStatus,
        actor: &Actor,
    ) -> Result<Counter, TurnioError> {
        let _guard = self.locks.lock_counter(id).await;
        let Some(mut counter) = self.store.get_counter(id).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: id.clone(),
            });
        };
        let old_status = counter.status;
        counter.status = status;

        let mut changes = Changeset::new();
        changes.update_counter(counter.clone());
        self.store.commit(changes).await?;

        info!(
            counter_id = %id,
            old_status = %old_status,
            new_status = %status,
            actor = %actor.id,
            "counter status changed"
        );

        let entry = AuditEntry::new(actor, AuditAction::Update, "Counter", &id.0)
            .with_old_value(old_status.to_string())
            .with_new_value(status.to_string())
            .with_details(format!(
                "Counter status changed from {old_status} to {status}"
            ));
        if let Err(e) = self.audit.record(entry).await {
            warn!(counter_id = %id, error = %e, "audit write failed (non-fatal)");
        }
        if let Err(e) = self.notifier.counter_status_changed(id, status).await {
            warn!(counter_id = %id, error = %e, "status notification failed (non-fatal)");
        }
        Ok(counter)
    }

    /// Includes or removes the counter from the issuance pool.
    pub async fn set_enabled(&self, id: &CounterId, enabled: bool) -> Result<Counter, TurnioError> {
        let _guard = self.locks.lock_counter(id).await;
        let Some(mut counter) = self.store.get_counter(id).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: id.clone(),
            });
        };
        counter.is_active = enabled;

        let mut changes = Changeset::new();
        changes.update_counter(counter.clone());
        self.store.commit(changes).await?;

        info!(counter_id = %id, enabled, "counter enablement changed");
        if let Err(e) = self.notifier.counter_updated(id).await {
            warn!(counter_id = %id, error = %e, "counter notification failed (non-fatal)");
        }
        Ok(counter)
    }
}
