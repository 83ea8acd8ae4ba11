// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket issuance: least-loaded routing and daily sequence numbering.
//!
//! Issuance is serialized per branch so two concurrent walk-ins can never
//! observe the same load snapshot. Because enablement toggles take only the
//! counter lock, the issuer re-reads its pick under that lock and reselects
//! if the counter was disabled or removed in the meantime.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use turnio_core::{
    BranchId, Changeset, Counter, CustomerInfo, Notifier, QueueStore, ServiceTypeId, Ticket,
    TicketId, TurnioError,
};

use crate::config::EngineConfig;
use crate::locks::LockRegistry;
use crate::metrics;

pub struct TicketIssuer {
    config: EngineConfig,
    store: Arc<dyn QueueStore>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<LockRegistry>,
}

impl TicketIssuer {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn QueueStore>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<LockRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
            locks,
        }
    }

    /// Issues a ticket, routing it to the least-loaded enabled counter of the
    /// branch. The ticket insert and the counter sequence bump commit as one
    /// unit, so a failed write burns no sequence number.
    pub async fn issue(
        &self,
        branch: BranchId,
        service_type: ServiceTypeId,
        customer: CustomerInfo,
    ) -> Result<Ticket, TurnioError> {
        let _branch_guard = self.locks.lock_branch(&branch).await;

        loop {
            let candidates = self.store.list_branch_counters(&branch).await?;
            let Some(selected) = pick_least_loaded(&candidates) else {
                return Err(TurnioError::NoAvailableCounter {
                    branch: branch.clone(),
                });
            };
            let selected_id = selected.id.clone();

            let _counter_guard = self.locks.lock_counter(&selected_id).await;
            // Re-read under the counter lock; enablement may have flipped
            // between the snapshot and here.
            let Some(mut counter) = self.store.get_counter(&selected_id).await? else {
                continue;
            };
            if !counter.is_active {
                continue;
            }

            let now = Utc::now();
            let today = now.date_naive();
            if counter.last_reset_date < today {
                counter.daily_sequence = 0;
                counter.last_reset_date = today;
            }
            counter.daily_sequence += 1;

            let number = format_ticket_number(
                &counter.prefix,
                counter.daily_sequence,
                self.config.number_pad_width,
            );
            let ticket = Ticket::new(
                TicketId::new(),
                branch.clone(),
                service_type.clone(),
                number,
                counter.id.clone(),
                customer.clone(),
                now,
            );

            let mut changes = Changeset::new();
            changes.update_counter(counter.clone());
            changes.insert_ticket(ticket.clone());
            self.store.commit(changes).await?;

            metrics::record_issued(&branch);
            info!(
                ticket_id = %ticket.id,
                ticket_number = %ticket.ticket_number,
                counter_id = %counter.id,
                branch_id = %branch,
                "ticket issued"
            );

            if let Err(e) = self.notifier.ticket_updated(&branch, &counter.id).await {
                warn!(
                    ticket_id = %ticket.id,
                    error = %e,
                    "ticket notification failed (non-fatal)"
                );
            }
            return Ok(ticket);
        }
    }
}

/// Picks the enabled counter with the smallest daily sequence, breaking ties
/// by counter id so the choice is deterministic.
fn pick_least_loaded(counters: &[Counter]) -> Option<&Counter> {
    counters
        .iter()
        .filter(|c| c.is_active)
        .min_by(|a, b| {
            a.daily_sequence
                .cmp(&b.daily_sequence)
                .then_with(|| a.id.cmp(&b.id))
        })
}

/// Formats `prefix` plus the zero-padded sequence, e.g. `C1` + 7 -> `C10007`.
/// Sequences wider than the pad width keep all their digits.
fn format_ticket_number(prefix: &str, sequence: u32, pad_width: usize) -> String {
    format!("{prefix}{sequence:0pad_width$}")
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use proptest::prelude::*;
    use turnio_bus::{BusNotifier, EventBus};
    use turnio_core::CounterId;
    use turnio_store::MemoryStore;

    use super::*;

    fn issuer_over(store: Arc<MemoryStore>) -> TicketIssuer {
        TicketIssuer::new(
            EngineConfig::default(),
            store,
            Arc::new(BusNotifier::new(EventBus::new(8))),
            Arc::new(LockRegistry::new()),
        )
    }

    async fn seed(store: &MemoryStore, counters: Vec<Counter>) {
        let mut changes = Changeset::new();
        for counter in counters {
            changes.insert_counter(counter);
        }
        store.commit(changes).await.unwrap();
    }

    fn counter_with_load(id: &str, sequence: u32) -> Counter {
        let mut counter = Counter::new(
            CounterId(id.into()),
            BranchId("b1".into()),
            format!("Counter {id}"),
            id.to_uppercase(),
        );
        counter.daily_sequence = sequence;
        counter
    }

    #[test]
    fn number_format_pads_to_width() {
        assert_eq!(format_ticket_number("C1", 7, 4), "C10007");
        assert_eq!(format_ticket_number("A", 123, 4), "A0123");
        assert_eq!(format_ticket_number("B", 12345, 4), "B12345");
    }

    #[test]
    fn least_loaded_pick_prefers_smallest_sequence() {
        let counters = vec![
            counter_with_load("c1", 5),
            counter_with_load("c2", 2),
            counter_with_load("c3", 8),
        ];
        let picked = pick_least_loaded(&counters).unwrap();
        assert_eq!(picked.id.0, "c2");
    }

    #[test]
    fn least_loaded_tie_breaks_by_id() {
        let counters = vec![counter_with_load("c2", 3), counter_with_load("c1", 3)];
        let picked = pick_least_loaded(&counters).unwrap();
        assert_eq!(picked.id.0, "c1");
    }

    #[test]
    fn disabled_counters_are_not_pickable() {
        let mut idle = counter_with_load("c1", 0);
        idle.is_active = false;
        let counters = vec![idle, counter_with_load("c2", 9)];
        let picked = pick_least_loaded(&counters).unwrap();
        assert_eq!(picked.id.0, "c2");
    }

    #[tokio::test]
    async fn issue_routes_to_least_loaded_and_bumps_sequence() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![
                counter_with_load("c1", 5),
                counter_with_load("c2", 2),
                counter_with_load("c3", 8),
            ],
        )
        .await;
        let issuer = issuer_over(store.clone());

        let ticket = issuer
            .issue(
                BranchId("b1".into()),
                ServiceTypeId("svc".into()),
                CustomerInfo::default(),
            )
            .await
            .unwrap();

        assert_eq!(ticket.counter_id, Some(CounterId("c2".into())));
        assert_eq!(ticket.ticket_number, "C20003");
        assert_eq!(
            ticket.status,
            turnio_core::TicketStatus::Waiting,
            "fresh tickets start out waiting"
        );

        let counter = store
            .get_counter(&CounterId("c2".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.daily_sequence, 3);
    }

    #[tokio::test]
    async fn stale_sequence_resets_before_numbering() {
        let store = Arc::new(MemoryStore::new());
        let mut counter = counter_with_load("c1", 42);
        counter.last_reset_date = (Utc::now() - Duration::days(1)).date_naive();
        seed(&store, vec![counter]).await;
        let issuer = issuer_over(store.clone());

        let ticket = issuer
            .issue(
                BranchId("b1".into()),
                ServiceTypeId("svc".into()),
                CustomerInfo::default(),
            )
            .await
            .unwrap();

        assert_eq!(ticket.ticket_number, "C10001");
        let stored = store
            .get_counter(&CounterId("c1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.daily_sequence, 1);
        assert_eq!(stored.last_reset_date, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn branch_without_enabled_counters_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let mut counter = counter_with_load("c1", 0);
        counter.is_active = false;
        seed(&store, vec![counter]).await;
        let issuer = issuer_over(store);

        let err = issuer
            .issue(
                BranchId("b1".into()),
                ServiceTypeId("svc".into()),
                CustomerInfo::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TurnioError::NoAvailableCounter { .. }));
    }

    #[tokio::test]
    async fn consecutive_issues_spread_across_counters() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![counter_with_load("c1", 0), counter_with_load("c2", 0)],
        )
        .await;
        let issuer = issuer_over(store);

        let mut routed = Vec::new();
        for _ in 0..4 {
            let ticket = issuer
                .issue(
                    BranchId("b1".into()),
                    ServiceTypeId("svc".into()),
                    CustomerInfo::default(),
                )
                .await
                .unwrap();
            routed.push(ticket.counter_id.unwrap().0);
        }
        // Round-robin falls out of least-loaded: c1, c2, c1, c2.
        assert_eq!(routed, vec!["c1", "c2", "c1", "c2"]);
    }

    proptest! {
        #[test]
        fn formatted_numbers_embed_the_full_sequence(
            sequence in 1u32..100_000,
            pad_width in 1usize..8,
        ) {
            let number = format_ticket_number("Z", sequence, pad_width);
            let digits = &number[1..];
            prop_assert!(digits.len() >= pad_width);
            prop_assert_eq!(digits.parse::<u32>().unwrap(), sequence);
        }
    }
}
