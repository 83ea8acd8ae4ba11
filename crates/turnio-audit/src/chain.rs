// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hash-chained audit log: each entry's digest covers its predecessor's, so
//! any retroactive edit breaks every later link.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::trace;

use turnio_core::{AuditEntry, AuditSink, TurnioError};

/// `prev_hash` of the first chain entry.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A chain verification failure, located at the first bad entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// The entry's stored digest does not match its recomputed one.
    #[error("hash mismatch at index {index}")]
    HashMismatch { index: u64 },

    /// The entry's `prev_hash` does not match the preceding entry's digest,
    /// or the indices are not contiguous from zero.
    #[error("broken link at index {index}")]
    BrokenLink { index: u64 },
}

/// An audit entry fixed into the chain. Serializable so a chain can be
/// exported and re-verified outside the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainedEntry {
    pub index: u64,
    pub prev_hash: String,
    pub hash: String,
    pub entry: AuditEntry,
}

/// Computes the digest fixing an entry at `index` behind `prev_hash`.
fn entry_digest(index: u64, prev_hash: &str, entry: &AuditEntry) -> Result<String, TurnioError> {
    let canonical = serde_json::to_string(entry).map_err(|e| TurnioError::Audit {
        message: "audit entry serialization failed".into(),
        source: Some(Box::new(e)),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(index.to_be_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Verifies an entry slice as a complete chain starting at the genesis hash.
pub fn verify_chain(entries: &[ChainedEntry]) -> Result<(), ChainError> {
    let mut prev = GENESIS_HASH.to_string();
    for (position, chained) in entries.iter().enumerate() {
        if chained.index != position as u64 || chained.prev_hash != prev {
            return Err(ChainError::BrokenLink {
                index: chained.index,
            });
        }
        let expected = entry_digest(chained.index, &chained.prev_hash, &chained.entry)
            .map_err(|_| ChainError::HashMismatch {
                index: chained.index,
            })?;
        if expected != chained.hash {
            return Err(ChainError::HashMismatch {
                index: chained.index,
            });
        }
        prev = chained.hash.clone();
    }
    Ok(())
}

/// In-memory [`AuditSink`] that keeps its entries on a sha256 hash chain.
#[derive(Debug, Default)]
pub struct HashChainAudit {
    entries: Mutex<Vec<ChainedEntry>>,
}

impl HashChainAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the chain in record order.
    pub async fn entries(&self) -> Vec<ChainedEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Recomputes every digest and link.
    pub async fn verify(&self) -> Result<(), ChainError> {
        let entries = self.entries.lock().await;
        verify_chain(&entries)
    }
}

#[async_trait]
impl AuditSink for HashChainAudit {
    async fn record(&self, entry: AuditEntry) -> Result<(), TurnioError> {
        let mut entries = self.entries.lock().await;
        let index = entries.len() as u64;
        let prev_hash = entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let hash = entry_digest(index, &prev_hash, &entry)?;
        trace!(
            index,
            action = %entry.action,
            entity = %entry.entity_name,
            entity_id = %entry.entity_id,
            "audit entry chained"
        );
        entries.push(ChainedEntry {
            index,
            prev_hash,
            hash,
            entry,
        });
        metrics::counter!("turnio_audit_entries_total").increment(1);
        Ok(())
    }
}
