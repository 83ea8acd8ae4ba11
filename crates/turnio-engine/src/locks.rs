// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Critical-section registry for branch, counter, and ledger operations.
//!
//! Locks are plain `tokio::sync::Mutex<()>` handles minted on first use and
//! cached per key. Acquisition order is fixed: ledger before counters, branch
//! before counter, and multiple counters in ascending id order. Every engine
//! component acquires through this registry so the order holds process-wide.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use turnio_core::{BranchId, CounterId};

/// Shared lock table handed to every engine component.
pub struct LockRegistry {
    branches: DashMap<BranchId, Arc<Mutex<()>>>,
    counters: DashMap<CounterId, Arc<Mutex<()>>>,
    ledger: Arc<Mutex<()>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            branches: DashMap::new(),
            counters: DashMap::new(),
            ledger: Arc::new(Mutex::new(())),
        }
    }

    /// Serializes ticket issuance and dispatch for one branch.
    pub async fn lock_branch(&self, id: &BranchId) -> OwnedMutexGuard<()> {
        let lock = self
            .branches
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Serializes state changes for one counter.
    pub async fn lock_counter(&self, id: &CounterId) -> OwnedMutexGuard<()> {
        let lock = self
            .counters
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Locks a set of counters in ascending id order. Duplicates are collapsed
    /// so the same mutex is never acquired twice.
    pub async fn lock_counters(&self, ids: &[CounterId]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<CounterId> = ids.to_vec();
        sorted.sort();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for id in &sorted {
            guards.push(self.lock_counter(id).await);
        }
        guards
    }

    /// Serializes assignment-record rewrites across all counters.
    pub async fn lock_ledger(&self) -> OwnedMutexGuard<()> {
        self.ledger.clone().lock_owned().await
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_branch_is_exclusive() {
        let locks = LockRegistry::new();
        let branch = BranchId("b1".into());
        let guard = locks.lock_branch(&branch).await;

        let entry = locks.branches.get(&branch).map(|e| e.clone());
        let handle = entry.expect("lock minted");
        assert!(handle.try_lock().is_err(), "second acquisition must block");
        drop(guard);
        assert!(handle.try_lock().is_ok());
    }

    #[tokio::test]
    async fn distinct_counters_do_not_contend() {
        let locks = LockRegistry::new();
        let _a = locks.lock_counter(&CounterId("c1".into())).await;
        let _b = locks.lock_counter(&CounterId("c2".into())).await;
    }

    #[tokio::test]
    async fn counter_set_is_deduplicated() {
        let locks = LockRegistry::new();
        let ids = vec![
            CounterId("c2".into()),
            CounterId("c1".into()),
            CounterId("c2".into()),
        ];
        let guards = locks.lock_counters(&ids).await;
        assert_eq!(guards.len(), 2);
    }
}
