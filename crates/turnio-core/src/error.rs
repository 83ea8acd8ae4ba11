// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Turnio queue engine.

use thiserror::Error;

use crate::types::{BranchId, CounterId, StaffId, TicketId};

/// The primary error type used across the engine and its collaborator traits.
///
/// The first four variants are the allocation/invariant violations raised to
/// callers synchronously. Collaborator failures on the fire-and-forget paths
/// (audit, notification) are logged by the engine and never surface through
/// its operations.
#[derive(Debug, Error)]
pub enum TurnioError {
    /// Issuance found no routable counter in the branch; the caller should
    /// retry later or surface "service unavailable".
    #[error("no active counter available in branch {branch}")]
    NoAvailableCounter { branch: BranchId },

    /// An operation referenced a counter id that does not exist. Not
    /// retryable without caller correction.
    #[error("counter not found: {counter}")]
    CounterNotFound { counter: CounterId },

    /// Self-assignment hit a counter already held by a different staff
    /// member. Caller-correctable: pick another counter or have a supervisor
    /// reassign.
    #[error("counter {counter} is occupied by {occupant_name}")]
    CounterOccupied {
        counter: CounterId,
        occupant: StaffId,
        occupant_name: String,
    },

    /// A transfer targeted a counter outside the ticket's branch.
    #[error(
        "ticket {ticket} belongs to branch {ticket_branch} but counter {counter} is in branch {counter_branch}"
    )]
    BranchMismatch {
        ticket: TicketId,
        ticket_branch: BranchId,
        counter: CounterId,
        counter_branch: BranchId,
    },

    /// Persistence collaborator failure (lookup, query, or commit).
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Audit collaborator failure. Swallowed by the engine, surfaced only in logs.
    #[error("audit error: {message}")]
    Audit {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Notification collaborator failure. Swallowed by the engine, surfaced only in logs.
    #[error("notification error: {message}")]
    Notify {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid TOML, unknown fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TurnioError {
    /// Storage failure with a plain message and no underlying cause.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }
}
