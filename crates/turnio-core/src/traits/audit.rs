// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit collaborator: fire-and-forget recording of who changed what.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TurnioError;
use crate::types::{Actor, AuditAction};

/// One audited state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor_id: String,
    pub actor_name: String,
    pub action: AuditAction,
    pub entity_name: String,
    pub entity_id: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub details: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: &Actor,
        action: AuditAction,
        entity_name: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            action,
            entity_name: entity_name.into(),
            entity_id: entity_id.into(),
            old_value: None,
            new_value: None,
            details: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_old_value(mut self, old: impl Into<String>) -> Self {
        self.old_value = Some(old.into());
        self
    }

    pub fn with_new_value(mut self, new: impl Into<String>) -> Self {
        self.new_value = Some(new.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Sink for audit entries.
///
/// Recording is fire-and-forget from the engine's point of view: a failed
/// write is logged by the caller and never alters the outcome of the primary
/// operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), TurnioError>;
}
