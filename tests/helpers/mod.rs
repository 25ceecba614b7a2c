#![allow(dead_code)]
use caseroom::bootstrap::build_app_state_with;
use caseroom::config::Config;
use caseroom::domain::entities::RoomPost;
use caseroom::domain::errors::SubscriberFault;
use caseroom::domain::events::RoomEvent;
use caseroom::domain::ports::clock::Clock;
use caseroom::domain::ports::event_bus::Listener;
use caseroom::infrastructure::http::middleware::AppState;
use caseroom::infrastructure::persistence::InMemoryPostStore;
use caseroom::shared::events::LocalEventBus;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to
#[derive(Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn at(millis: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(millis),
        })
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub fn post_event(id: &str, ts: i64, who: &str, text: &str) -> RoomEvent {
    RoomEvent::Post(RoomPost {
        id: id.to_string(),
        ts,
        who: who.to_string(),
        text: text.to_string(),
    })
}

/// Listener that appends every event it sees to a shared log
pub fn recorder() -> (Listener, Arc<Mutex<Vec<RoomEvent>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let listener: Listener = Arc::new(move |event: &RoomEvent| -> Result<(), SubscriberFault> {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });
    (listener, log)
}

/// App state on a private bus and an in-memory store
pub fn test_state(bus: &LocalEventBus, clock: Arc<ManualClock>) -> AppState {
    let store = Arc::new(InMemoryPostStore::new(clock.clone()));
    build_app_state_with(&Config::default(), Arc::new(bus.clone()), store, clock)
}
