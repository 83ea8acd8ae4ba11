// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notifiers for deterministic testing.
//!
//! [`RecordingNotifier`] captures every notification for assertion;
//! [`FailingNotifier`] fails every call, for verifying that notification
//! failures never change an operation's outcome.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use turnio_core::{BranchId, CounterId, CounterStatus, Notifier, StaffId, TurnioError};

/// One captured notifier call.
#[derive(Debug, Clone, PartialEq)]
pub enum NotifierCall {
    TicketUpdated {
        branch_id: BranchId,
        counter_id: CounterId,
    },
    CounterUpdated {
        counter_id: CounterId,
    },
    CounterStatusChanged {
        counter_id: CounterId,
        status: CounterStatus,
    },
    CounterAssigned {
        branch_id: BranchId,
        counter_id: CounterId,
        staff_id: StaffId,
        staff_name: String,
    },
    CounterUnassigned {
        branch_id: BranchId,
        counter_id: CounterId,
    },
}

/// A notifier that records every call and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<NotifierCall>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured calls, in order.
    pub async fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }

    async fn push(&self, call: NotifierCall) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn ticket_updated(
        &self,
        branch_id: &BranchId,
        counter_id: &CounterId,
    ) -> Result<(), TurnioError> {
        self.push(NotifierCall::TicketUpdated {
            branch_id: branch_id.clone(),
            counter_id: counter_id.clone(),
        })
        .await;
        Ok(())
    }

    async fn counter_updated(&self, counter_id: &CounterId) -> Result<(), TurnioError> {
        self.push(NotifierCall::CounterUpdated {
            counter_id: counter_id.clone(),
        })
        .await;
        Ok(())
    }

    async fn counter_status_changed(
        &self,
        counter_id: &CounterId,
        status: CounterStatus,
    ) -> Result<(), TurnioError> {
        self.push(NotifierCall::CounterStatusChanged {
            counter_id: counter_id.clone(),
            status,
        })
        .await;
        Ok(())
    }

    async fn counter_assigned(
        &self,
        branch_id: &BranchId,
        counter_id: &CounterId,
        staff_id: &StaffId,
        staff_name: &str,
    ) -> Result<(), TurnioError> {
        self.push(NotifierCall::CounterAssigned {
            branch_id: branch_id.clone(),
            counter_id: counter_id.clone(),
            staff_id: staff_id.clone(),
            staff_name: staff_name.to_string(),
        })
        .await;
        Ok(())
    }

    async fn counter_unassigned(
        &self,
        branch_id: &BranchId,
        counter_id: &CounterId,
    ) -> Result<(), TurnioError> {
        self.push(NotifierCall::CounterUnassigned {
            branch_id: branch_id.clone(),
            counter_id: counter_id.clone(),
        })
        .await;
        Ok(())
    }
}

/// A notifier whose every call fails with [`TurnioError::Notify`].
#[derive(Debug, Default)]
pub struct FailingNotifier;

impl FailingNotifier {
    pub fn new() -> Self {
        Self
    }

    fn failure() -> TurnioError {
        TurnioError::Notify {
            message: "mock notifier failure".to_string(),
            source: None,
        }
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn ticket_updated(
        &self,
        _branch_id: &BranchId,
        _counter_id: &CounterId,
    ) -> Result<(), TurnioError> {
        Err(Self::failure())
    }

    async fn counter_updated(&self, _counter_id: &CounterId) -> Result<(), TurnioError> {
        Err(Self::failure())
    }

    async fn counter_status_changed(
        &self,
        _counter_id: &CounterId,
        _status: CounterStatus,
    ) -> Result<(), TurnioError> {
        Err(Self::failure())
    }

    async fn counter_assigned(
        &self,
        _branch_id: &BranchId,
        _counter_id: &CounterId,
        _staff_id: &StaffId,
        _staff_name: &str,
    ) -> Result<(), TurnioError> {
        Err(Self::failure())
    }

    async fn counter_unassigned(
        &self,
        _branch_id: &BranchId,
        _counter_id: &CounterId,
    ) -> Result<(), TurnioError> {
        Err(Self::failure())
    }
}
