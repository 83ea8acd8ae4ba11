// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock audit sinks: one that records, one that always fails.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use turnio_core::{AuditEntry, AuditSink, TurnioError};

/// An audit sink that appends entries to a plain list.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), TurnioError> {
        self.entries.lock().await.push(entry);
        Ok(())
    }
}

/// An audit sink whose every write fails with [`TurnioError::Audit`].
#[derive(Debug, Default)]
pub struct FailingAuditSink;

impl FailingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _entry: AuditEntry) -> Result<(), TurnioError> {
        Err(TurnioError::Audit {
            message: "mock audit failure".to_string(),
            source: None,
        })
    }
}
