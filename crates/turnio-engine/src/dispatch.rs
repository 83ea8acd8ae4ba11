// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call dispatch: pulls the next waiting ticket to a counter.
//!
//! Dispatch looks in two places. The direct queue holds tickets routed to the
//! calling counter at issue time. When that queue is empty, the rescue scan
//! claims the oldest branch ticket stranded with no counter or behind a
//! counter that is not currently online, so closing a counter mid-day cannot
//! orphan the people already queued at it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use strum::Display;
use tracing::{debug, info, warn};
use turnio_core::{
    Changeset, Counter, CounterId, CounterStatus, Notifier, QueueStore, StaffId, Ticket,
    TicketFilter, TicketStatus, TurnioError,
};

use crate::config::EngineConfig;
use crate::locks::LockRegistry;
use crate::metrics;

/// Which queue a dispatched ticket came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DispatchPath {
    Direct,
    Rescue,
}

pub struct CallDispatcher {
    config: EngineConfig,
    store: Arc<dyn QueueStore>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<LockRegistry>,
}

impl CallDispatcher {
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

    /// Calls the next ticket to `counter_id`, optionally stamping the staff
    /// member who will serve it. Returns `None` when nothing is waiting.
    pub async fn call_next(
        &self,
        counter_id: &CounterId,
        staff: Option<StaffId>,
    ) -> Result<Option<Ticket>, TurnioError> {
        let Some(probe) = self.store.get_counter(counter_id).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        };
        let branch = probe.branch_id.clone();

        let _branch_guard = self.locks.lock_branch(&branch).await;
        let _counter_guard = self.locks.lock_counter(counter_id).await;
        let Some(mut counter) = self.store.get_counter(counter_id).await? else {
            return Err(TurnioError::CounterNotFound {
                counter: counter_id.clone(),
            });
        };

        let direct = self
            .store
            .find_tickets(
                &TicketFilter::new()
                    .in_branch(branch.clone())
                    .at_counter(counter_id.clone())
                    .with_status(TicketStatus::Waiting),
            )
            .await?;

        let (mut ticket, path) = match earliest(direct) {
            Some(ticket) => (ticket, DispatchPath::Direct),
            None if self.config.rescue_enabled => {
                match self.rescue_candidate(&counter).await? {
                    Some(ticket) => (ticket, DispatchPath::Rescue),
                    None => {
                        debug!(counter_id = %counter_id, branch_id = %branch, "nothing waiting");
                        return Ok(None);
                    }
                }
            }
            None => {
                debug!(counter_id = %counter_id, branch_id = %branch, "nothing waiting");
                return Ok(None);
            }
        };

        let now = Utc::now();
        let waited = (now - ticket.created_at).num_milliseconds() as f64 / 1000.0;
        ticket.status = TicketStatus::Called;
        ticket.counter_id = Some(counter_id.clone());
        ticket.staff_id = staff;
        ticket.called_at = Some(now);
        ticket.start_service_time = Some(now);
        ticket.updated_at = now;
        counter.current_ticket_id = Some(ticket.id.clone());

        let mut changes = Changeset::new();
        changes.update_ticket(ticket.clone());
        changes.update_counter(counter);
        self.store.commit(changes).await?;

        metrics::record_dispatched(path);
        metrics::record_call_wait(waited.max(0.0));
        info!(
            ticket_id = %ticket.id,
            ticket_number = %ticket.ticket_number,
            counter_id = %counter_id,
            path = %path,
            "ticket dispatched"
        );

        if let Err(e) = self.notifier.ticket_updated(&branch, counter_id).await {
            warn!(ticket_id = %ticket.id, error = %e, "ticket notification failed (non-fatal)");
        }
        if let Err(e) = self.notifier.counter_updated(counter_id).await {
            warn!(counter_id = %counter_id, error = %e, "counter notification failed (non-fatal)");
        }
        Ok(Some(ticket))
    }

    /// Oldest branch ticket that no online counter besides this one can
    /// reach: either never routed, or routed to a counter that is offline,
    /// on break, or gone.
    async fn rescue_candidate(&self, counter: &Counter) -> Result<Option<Ticket>, TurnioError> {
        let reachable: HashSet<CounterId> = self
            .store
            .list_branch_counters(&counter.branch_id)
            .await?
            .into_iter()
            .filter(|c| c.id != counter.id && c.status == CounterStatus::Online)
            .map(|c| c.id)
            .collect();

        let waiting = self
            .store
            .find_tickets(
                &TicketFilter::new()
                    .in_branch(counter.branch_id.clone())
                    .with_status(TicketStatus::Waiting),
            )
            .await?;
        let stranded = waiting
            .into_iter()
            .filter(|ticket| match &ticket.counter_id {
                None => true,
                Some(home) => !reachable.contains(home),
            })
            .collect();
        Ok(earliest(stranded))
    }
}

/// First-come-first-served order: creation time, ties broken by ticket id.
fn earliest(tickets: Vec<Ticket>) -> Option<Ticket> {
    tickets.into_iter().min_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use turnio_bus::{BusNotifier, EventBus, QueueEvent};
    use turnio_core::{BranchId, CustomerInfo, ServiceTypeId, TicketId};
    use turnio_store::MemoryStore;

    use super::*;

    fn dispatcher_over(store: Arc<MemoryStore>, config: EngineConfig) -> CallDispatcher {
        CallDispatcher::new(
            config,
            store,
            Arc::new(BusNotifier::new(EventBus::new(8))),
            Arc::new(LockRegistry::new()),
        )
    }

    fn counter(id: &str, status: CounterStatus) -> Counter {
        let mut counter = Counter::new(
            CounterId(id.into()),
            BranchId("b1".into()),
            format!("Counter {id}"),
            id.to_uppercase(),
        );
        counter.status = status;
        counter
    }

    fn waiting_ticket(number: &str, counter_id: Option<&str>, age_secs: i64) -> Ticket {
        let created = Utc::now() - Duration::seconds(age_secs);
        let mut ticket = Ticket::new(
            TicketId::new(),
            BranchId("b1".into()),
            ServiceTypeId("svc".into()),
            number,
            CounterId(counter_id.unwrap_or("c0").into()),
            CustomerInfo::default(),
            created,
        );
        ticket.counter_id = counter_id.map(|id| CounterId(id.into()));
        ticket
    }

    async fn seed(store: &MemoryStore, counters: Vec<Counter>, tickets: Vec<Ticket>) {
        let mut changes = Changeset::new();
        for c in counters {
            changes.insert_counter(c);
        }
        for t in tickets {
            changes.insert_ticket(t);
        }
        store.commit(changes).await.unwrap();
    }

    #[tokio::test]
    async fn direct_queue_is_served_oldest_first() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![counter("c1", CounterStatus::Online)],
            vec![
                waiting_ticket("C10002", Some("c1"), 10),
                waiting_ticket("C10001", Some("c1"), 60),
            ],
        )
        .await;
        let dispatcher = dispatcher_over(store.clone(), EngineConfig::default());

        let first = dispatcher
            .call_next(&CounterId("c1".into()), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.ticket_number, "C10001");
        assert_eq!(first.status, TicketStatus::Called);
        assert!(first.called_at.is_some());
        assert!(first.start_service_time.is_some());

        let counter = store
            .get_counter(&CounterId("c1".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.current_ticket_id, Some(first.id.clone()));

        let second = dispatcher
            .call_next(&CounterId("c1".into()), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.ticket_number, "C10002");
    }

    #[tokio::test]
    async fn rescue_claims_tickets_stranded_behind_offline_counters() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![
                counter("c1", CounterStatus::Offline),
                counter("c2", CounterStatus::Online),
            ],
            vec![waiting_ticket("C10001", Some("c1"), 30)],
        )
        .await;
        let dispatcher = dispatcher_over(store.clone(), EngineConfig::default());

        let rescued = dispatcher
            .call_next(&CounterId("c2".into()), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rescued.ticket_number, "C10001");
        assert_eq!(rescued.counter_id, Some(CounterId("c2".into())));

        let c2 = store
            .get_counter(&CounterId("c2".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(c2.current_ticket_id, Some(rescued.id));
    }

    #[tokio::test]
    async fn rescue_covers_unrouted_and_break_tickets_but_not_online_queues() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![
                counter("c1", CounterStatus::Online),
                counter("c2", CounterStatus::Break),
                counter("c3", CounterStatus::Online),
            ],
            vec![
                // Oldest, but parked behind an online counter: off limits.
                waiting_ticket("C10001", Some("c1"), 90),
                // Behind a counter on break: claimable.
                waiting_ticket("C20001", Some("c2"), 60),
                // Never routed: claimable.
                waiting_ticket("X0001", None, 30),
            ],
        )
        .await;
        let dispatcher = dispatcher_over(store.clone(), EngineConfig::default());

        let rescued = dispatcher
            .call_next(&CounterId("c3".into()), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rescued.ticket_number, "C20001", "oldest claimable wins");

        let next = dispatcher
            .call_next(&CounterId("c3".into()), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.ticket_number, "X0001");

        // c1's own queue is untouched by the rescues.
        let remaining = store
            .find_tickets(&TicketFilter::new().with_status(TicketStatus::Waiting))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].ticket_number, "C10001");
        assert_eq!(remaining[0].counter_id, Some(CounterId("c1".into())));
    }

    #[tokio::test]
    async fn empty_branch_returns_none() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, vec![counter("c1", CounterStatus::Online)], vec![]).await;
        let dispatcher = dispatcher_over(store, EngineConfig::default());

        let result = dispatcher
            .call_next(&CounterId("c1".into()), None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unknown_counter_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher_over(store, EngineConfig::default());

        let err = dispatcher
            .call_next(&CounterId("ghost".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnioError::CounterNotFound { .. }));
    }

    #[tokio::test]
    async fn rescue_can_be_disabled() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![
                counter("c1", CounterStatus::Offline),
                counter("c2", CounterStatus::Online),
            ],
            vec![waiting_ticket("C10001", Some("c1"), 30)],
        )
        .await;
        let config = EngineConfig {
            rescue_enabled: false,
            ..EngineConfig::default()
        };
        let dispatcher = dispatcher_over(store, config);

        let result = dispatcher
            .call_next(&CounterId("c2".into()), None)
            .await
            .unwrap();
        assert!(result.is_none(), "stranded ticket stays put with rescue off");
    }

    #[tokio::test]
    async fn staff_is_stamped_when_provided() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![counter("c1", CounterStatus::Online)],
            vec![waiting_ticket("C10001", Some("c1"), 5)],
        )
        .await;
        let dispatcher = dispatcher_over(store, EngineConfig::default());

        let ticket = dispatcher
            .call_next(&CounterId("c1".into()), Some(StaffId("s1".into())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.staff_id, Some(StaffId("s1".into())));
    }

    #[tokio::test]
    async fn dispatch_notifies_ticket_and_counter() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            vec![counter("c1", CounterStatus::Online)],
            vec![waiting_ticket("C10001", Some("c1"), 5)],
        )
        .await;
        let bus = EventBus::new(8);
        let dispatcher = CallDispatcher::new(
            EngineConfig::default(),
            store,
            Arc::new(BusNotifier::new(bus.clone())),
            Arc::new(LockRegistry::new()),
        );
        let mut rx = bus.subscribe();

        dispatcher
            .call_next(&CounterId("c1".into()), None)
            .await
            .unwrap()
            .unwrap();

        let first = rx.try_recv().unwrap();
        assert!(matches!(first.event, QueueEvent::TicketUpdated { .. }));
        let second = rx.try_recv().unwrap();
        assert!(matches!(second.event, QueueEvent::CounterUpdated { .. }));
    }
}
