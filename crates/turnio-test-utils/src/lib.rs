// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Turnio integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic,
//! CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`QueueHarness`] - Full engine over an in-memory store, hash-chained
//!   audit, and a real event bus
//! - [`RecordingNotifier`] / [`FailingNotifier`] - Notifier mocks
//! - [`RecordingAuditSink`] / [`FailingAuditSink`] - Audit sink mocks

pub mod harness;
pub mod mock_audit;
pub mod mock_notifier;

pub use harness::{QueueHarness, QueueHarnessBuilder};
pub use mock_audit::{FailingAuditSink, RecordingAuditSink};
pub use mock_notifier::{FailingNotifier, NotifierCall, RecordingNotifier};
