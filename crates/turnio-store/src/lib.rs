// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference persistence for the Turnio queue engine.
//!
//! The persistence boundary is the [`turnio_core::QueueStore`] trait; this
//! crate provides the in-process implementation used by tests and
//! single-node embeddings. Durable backends live outside this workspace.

pub mod memory;

pub use memory::MemoryStore;
