use crate::domain::errors::SubscriberFault;
use crate::domain::events::{RoomEvent, SessionFrame};
use crate::domain::ports::clock::Clock;
use crate::domain::ports::event_bus::{EventBus, Subscription};
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(20);

/// Why a live session stopped streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The viewer went away and the transport dropped the stream
    Disconnected,
    /// A write to the viewer's stream failed
    TransportFault,
    /// Closed by the server
    Closed,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Disconnected => "disconnected",
            CloseReason::TransportFault => "transport_fault",
            CloseReason::Closed => "closed",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opens per-viewer sessions on top of the room bus
#[derive(Clone)]
pub struct LiveFeedService {
    bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    keep_alive: Duration,
}

impl LiveFeedService {
    pub fn new(bus: Arc<dyn EventBus>, clock: Arc<dyn Clock>, keep_alive: Duration) -> Self {
        Self {
            bus,
            clock,
            keep_alive,
        }
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Open a session: queue the hello frame, subscribe to the bus, then start
    /// the keep-alive ticker. Must be called from within a Tokio runtime.
    pub fn open_session(&self) -> LiveSession {
        let (tx, rx) = mpsc::unbounded_channel();
        let control = Arc::new(SessionControl::new());

        // The receiver is alive, so this cannot fail.
        let _ = tx.send(SessionFrame::Hello {
            ts: self.clock.now_millis(),
        });

        let subscription = self.bus.subscribe(forward_to(tx.clone(), &control));
        control.attach_subscription(subscription);
        control.attach_ticker(self.spawn_ticker(tx, &control));

        metrics::counter!("room_sessions_opened_total").increment(1);
        metrics::gauge!("room_live_sessions").increment(1.0);
        tracing::info!(session_id = %control.id, "Live session opened");

        LiveSession {
            control,
            frames: UnboundedReceiverStream::new(rx),
        }
    }

    fn spawn_ticker(
        &self,
        tx: mpsc::UnboundedSender<SessionFrame>,
        control: &Arc<SessionControl>,
    ) -> JoinHandle<()> {
        let period = self.keep_alive;
        let start = Instant::now() + period;
        let clock = self.clock.clone();
        let control = Arc::downgrade(control);

        tokio::spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let ping = RoomEvent::Ping {
                    ts: clock.now_millis(),
                };
                // Receiver gone; see `forward_to`
                if tx.send(ping.into()).is_err() {
                    if let Some(control) = control.upgrade() {
                        control.close(CloseReason::TransportFault);
                    }
                    break;
                }
            }
        })
    }
}

/// Bus listener that pushes events into one session's channel.
///
/// A send only fails once the receiver is gone without `LiveSession::drop`
/// having run. When serving HTTP, a failed socket write shows up instead as
/// axum dropping the body stream, which closes the session as `Disconnected`.
fn forward_to(
    tx: mpsc::UnboundedSender<SessionFrame>,
    control: &Arc<SessionControl>,
) -> crate::domain::ports::event_bus::Listener {
    let control = Arc::downgrade(control);
    Arc::new(move |event: &RoomEvent| -> Result<(), SubscriberFault> {
        let Some(control) = control.upgrade() else {
            return Ok(());
        };
        if control.is_closed() {
            return Ok(());
        }
        if tx.send(event.clone().into()).is_err() {
            control.close(CloseReason::TransportFault);
            return Err(SubscriberFault::Transport(format!(
                "session {} stream is gone",
                control.id
            )));
        }
        Ok(())
    })
}

/// Resources owned by one session, released exactly once
struct SessionControl {
    id: Uuid,
    closed: AtomicBool,
    ticker: Mutex<Option<JoinHandle<()>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionControl {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            closed: AtomicBool::new(false),
            ticker: Mutex::new(None),
            subscription: Mutex::new(None),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn attach_subscription(&self, subscription: Subscription) {
        *self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);
        if self.is_closed() {
            self.release_subscription();
        }
    }

    fn attach_ticker(&self, ticker: JoinHandle<()>) {
        *self.ticker.lock().unwrap_or_else(PoisonError::into_inner) = Some(ticker);
        if self.is_closed() {
            self.release_ticker();
        }
    }

    fn release_ticker(&self) {
        let ticker = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ticker) = ticker {
            ticker.abort();
        }
    }

    fn release_subscription(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }

    /// Stop the ticker, then leave the bus. Returns false if already closed.
    fn close(&self, reason: CloseReason) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.release_ticker();
        self.release_subscription();

        metrics::counter!("room_sessions_closed_total", "reason" => reason.as_str()).increment(1);
        metrics::gauge!("room_live_sessions").decrement(1.0);
        tracing::info!(session_id = %self.id, reason = %reason, "Live session closed");
        true
    }
}

/// One viewer's ordered view of the room: a hello frame, then bus events and
/// keep-alive pings until the session closes. Dropping it closes the session.
pub struct LiveSession {
    control: Arc<SessionControl>,
    frames: UnboundedReceiverStream<SessionFrame>,
}

impl LiveSession {
    pub fn id(&self) -> Uuid {
        self.control.id
    }

    pub fn is_closed(&self) -> bool {
        self.control.is_closed()
    }

    /// Tear the session down. Safe to call repeatedly.
    pub fn close(&self) -> bool {
        self.control.close(CloseReason::Closed)
    }
}

impl Stream for LiveSession {
    type Item = SessionFrame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.control.is_closed() {
            return Poll::Ready(None);
        }
        Pin::new(&mut this.frames).poll_next(cx)
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.control.close(CloseReason::Disconnected);
    }
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("id", &self.control.id)
            .field("closed", &self.control.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::runtime::clock::SystemClock;
    use crate::shared::events::LocalEventBus;
    use tokio_stream::StreamExt;

    fn feed(bus: &LocalEventBus) -> LiveFeedService {
        LiveFeedService::new(
            Arc::new(bus.clone()),
            Arc::new(SystemClock::new()),
            DEFAULT_KEEP_ALIVE,
        )
    }

    #[tokio::test]
    async fn test_session_opens_with_hello_and_subscribes() {
        let bus = LocalEventBus::new();
        let mut session = feed(&bus).open_session();

        assert_eq!(bus.subscriber_count(), 1);
        let first = session.next().await.unwrap();
        assert_eq!(first.kind(), "hello");
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_unsubscribes() {
        let bus = LocalEventBus::new();
        let mut session = feed(&bus).open_session();

        assert!(session.close());
        assert!(!session.close());
        assert!(session.is_closed());
        assert_eq!(bus.subscriber_count(), 0);
        assert!(session.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let bus = LocalEventBus::new();
        let session = feed(&bus).open_session();
        assert_eq!(bus.subscriber_count(), 1);

        drop(session);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_listener_write_failure_closes_session() {
        let bus = LocalEventBus::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let control = Arc::new(SessionControl::new());
        control.attach_subscription(bus.subscribe(forward_to(tx, &control)));
        drop(rx);

        bus.emit(RoomEvent::Ping { ts: 1 });

        assert!(control.is_closed());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_listener_reports_transport_fault() {
        let (tx, rx) = mpsc::unbounded_channel();
        let control = Arc::new(SessionControl::new());
        let listener = forward_to(tx, &control);
        drop(rx);

        let result = listener(&RoomEvent::Ping { ts: 1 });
        assert!(matches!(result, Err(SubscriberFault::Transport(_))));
        assert!(control.is_closed());

        // Closed sessions swallow further events quietly
        assert!(listener(&RoomEvent::Ping { ts: 2 }).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_write_failure_closes_session() {
        let bus = LocalEventBus::new();
        let service = feed(&bus);
        let (tx, rx) = mpsc::unbounded_channel();
        let control = Arc::new(SessionControl::new());
        drop(rx);

        let ticker = service.spawn_ticker(tx, &control);
        ticker.await.unwrap();

        assert!(control.is_closed());
    }

    #[test]
    fn test_close_reason_labels() {
        assert_eq!(CloseReason::Disconnected.to_string(), "disconnected");
        assert_eq!(CloseReason::TransportFault.as_str(), "transport_fault");
    }
}
