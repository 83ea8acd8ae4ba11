// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turnio engine: ticket issuance, call dispatch, lifecycle transitions,
//! and the counter assignment ledger.
//!
//! [`QueueEngine`] wires the five components over one [`turnio_core::QueueStore`],
//! one audit sink, and one notifier. Components can also be used on their own
//! when a deployment only needs part of the surface, as long as they share a
//! [`LockRegistry`].

pub mod assignment;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod issuer;
pub mod lifecycle;
pub mod locks;
pub mod metrics;
pub mod registry;

pub use assignment::AssignmentLedger;
pub use config::{
    load_and_validate_str, load_config, load_config_from_path, load_config_from_str, EngineConfig,
    EventsConfig, TurnioConfig,
};
pub use dispatch::{CallDispatcher, DispatchPath};
pub use engine::QueueEngine;
pub use issuer::TicketIssuer;
pub use lifecycle::{CustomerUpdate, LifecycleController};
pub use locks::LockRegistry;
pub use metrics::register_metrics;
pub use registry::CounterRegistry;
