// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the queue engine.
//!
//! The engine is a library of operations invoked by an enclosing service;
//! persistence, audit, and notification delivery live behind these traits
//! and use `#[async_trait]` for dynamic dispatch.

pub mod audit;
pub mod notify;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use audit::{AuditEntry, AuditSink};
pub use notify::Notifier;
pub use store::{AssignmentFilter, Changeset, QueueStore, TicketFilter};
