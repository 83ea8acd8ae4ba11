// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use turnio_core::BranchId;

use crate::dispatch::DispatchPath;

/// Register all Turnio metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("turnio_tickets_issued_total", "Total tickets issued");
    describe_counter!(
        "turnio_tickets_dispatched_total",
        "Total tickets dispatched to counters"
    );
    describe_counter!("turnio_tickets_completed_total", "Total tickets completed");
    describe_counter!("turnio_tickets_missed_total", "Total tickets marked missed");
    describe_counter!(
        "turnio_tickets_transferred_total",
        "Total tickets transferred between counters"
    );
    describe_counter!(
        "turnio_assignment_records_total",
        "Assignment records opened and closed"
    );
    describe_counter!("turnio_audit_entries_total", "Audit chain entries recorded");
    describe_gauge!("turnio_queue_depth", "Waiting tickets per branch");
    describe_histogram!(
        "turnio_call_wait_seconds",
        "Time between ticket creation and first call"
    );
}

/// Record an issued ticket.
pub fn record_issued(branch: &BranchId) {
    metrics::counter!("turnio_tickets_issued_total", "branch" => branch.0.clone()).increment(1);
}

/// Record a dispatched ticket and which queue served it.
pub fn record_dispatched(path: DispatchPath) {
    metrics::counter!("turnio_tickets_dispatched_total", "path" => path.to_string()).increment(1);
}

/// Record a completed ticket.
pub fn record_completed() {
    metrics::counter!("turnio_tickets_completed_total").increment(1);
}

/// Record a missed ticket.
pub fn record_missed() {
    metrics::counter!("turnio_tickets_missed_total").increment(1);
}

/// Record a ticket transfer.
pub fn record_transferred() {
    metrics::counter!("turnio_tickets_transferred_total").increment(1);
}

/// Record assignment-ledger activity.
pub fn record_assignments(op: &'static str, count: u64) {
    metrics::counter!("turnio_assignment_records_total", "op" => op).increment(count);
}

/// Set the waiting-ticket depth for a branch.
pub fn set_queue_depth(branch: &BranchId, depth: f64) {
    metrics::gauge!("turnio_queue_depth", "branch" => branch.0.clone()).set(depth);
}

/// Record how long a ticket waited before its first call.
pub fn record_call_wait(seconds: f64) {
    metrics::histogram!("turnio_call_wait_seconds").record(seconds);
}
