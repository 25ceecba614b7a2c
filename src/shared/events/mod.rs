use crate::domain::errors::SubscriberFault;
use crate::domain::events::RoomEvent;
use crate::domain::ports::event_bus::{EventBus, Listener, Subscription};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

static ROOM_BUS: OnceLock<Arc<LocalEventBus>> = OnceLock::new();

/// The process-wide room bus. Created on first use and shared by every
/// request for the lifetime of the process.
pub fn room_bus() -> Arc<LocalEventBus> {
    ROOM_BUS
        .get_or_init(|| {
            tracing::info!("Room event bus initialized");
            Arc::new(LocalEventBus::new())
        })
        .clone()
}

#[derive(Clone)]
struct Registration {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Registration>,
}

/// Local in-memory implementation of EventBus.
///
/// Delivery is snapshot-then-iterate: `emit` copies the listener list and
/// releases the lock before calling anyone, so listeners may subscribe or
/// unsubscribe from inside a delivery. A listener added during an emit does
/// not see that event. A listener removed during an emit is skipped from the
/// moment its removal completes.
#[derive(Clone, Default)]
pub struct LocalEventBus {
    registry: Arc<Mutex<Registry>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // Listeners never run under this lock, so a poisoned guard still
        // holds a consistent list.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(registration: &Registration, event: &RoomEvent) {
        let outcome = catch_unwind(AssertUnwindSafe(|| (registration.listener)(event)));
        let fault = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(fault)) => fault,
            Err(_) => SubscriberFault::Listener("listener panicked".to_string()),
        };

        metrics::counter!("room_subscriber_faults_total").increment(1);
        tracing::warn!(
            subscriber_id = registration.id,
            event = event.kind(),
            "Subscriber fault ignored: {}",
            fault
        );
    }
}

fn remove_registration(registry: &Weak<Mutex<Registry>>, id: u64) {
    if let Some(registry) = registry.upgrade() {
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.entries.retain(|entry| entry.id != id);
    }
}

impl EventBus for LocalEventBus {
    fn emit(&self, event: RoomEvent) {
        let snapshot = self.lock().entries.clone();
        metrics::counter!("room_events_emitted_total").increment(1);

        if snapshot.is_empty() {
            tracing::debug!(event = event.kind(), "No active subscribers for event");
            return;
        }

        for registration in &snapshot {
            if !registration.active.load(Ordering::Acquire) {
                continue;
            }
            Self::deliver(registration, &event);
        }
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut registry = self.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Registration {
                id,
                active: active.clone(),
                listener,
            });
            id
        };
        tracing::debug!(subscriber_id = id, "Subscriber registered");

        let registry = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            active.store(false, Ordering::Release);
            remove_registration(&registry, id);
            tracing::debug!(subscriber_id = id, "Subscriber removed");
        })
    }

    fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }
}
