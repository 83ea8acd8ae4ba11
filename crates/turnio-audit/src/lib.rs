// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tamper-evident audit trail for the Turnio queue engine.
//!
//! Implements the [`turnio_core::AuditSink`] collaborator as a sha256 hash
//! chain: every recorded entry is digested together with its predecessor's
//! digest, making silent edits and reordering detectable by re-verification.

pub mod chain;

pub use chain::{verify_chain, ChainError, ChainedEntry, HashChainAudit, GENESIS_HASH};
