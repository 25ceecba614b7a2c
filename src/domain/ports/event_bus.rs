use crate::domain::errors::SubscriberFault;
use crate::domain::events::RoomEvent;
use std::sync::{Arc, Mutex, PoisonError};

/// Callback registered on the bus; runs synchronously inside `emit`
pub type Listener = Arc<dyn Fn(&RoomEvent) -> Result<(), SubscriberFault> + Send + Sync>;

/// In-process publish/subscribe register for room events
pub trait EventBus: Send + Sync {
    /// Deliver an event to every listener registered at the time of the call.
    /// Listener failures are contained; this never fails.
    fn emit(&self, event: RoomEvent);

    /// Register a listener for events emitted from now on
    fn subscribe(&self, listener: Listener) -> Subscription;

    fn subscriber_count(&self) -> usize;
}

type Cancel = Box<dyn FnOnce() + Send>;

/// Handle that removes a listener from the bus.
///
/// `unsubscribe` may be called any number of times; only the first call has
/// an effect. Dropping the handle unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Mutex<Option<Cancel>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    pub fn unsubscribe(&self) {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
