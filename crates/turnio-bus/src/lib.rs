// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal typed event bus for the Turnio workspace.
//!
//! Queue state changes are published as structured [`QueueEvent`]s over a
//! `tokio::sync::broadcast` channel. Delivery is best-effort by design:
//! subscribers that lag past the channel capacity miss events, and zero
//! subscribers is a normal state.

pub mod bus;
pub mod event;

pub use bus::{BusNotifier, EventBus, DEFAULT_CAPACITY};
pub use event::{Envelope, QueueEvent};
