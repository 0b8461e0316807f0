use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    location::{LocationEvent, Position, WatchErrorCode, WatchHandle},
    prelude::*,
    report::{LocationPayload, ReportingClient},
    shell::Notifier,
    source::{PositionSource, WatchOptions},
};

/// Notified whenever the relay's position buffer changes. UIs use this to know when
/// to re-pull [LocationRelay::positions].
pub trait StateUpdateSender: Send + Sync {
    fn send_update(&self);
}

/// How many events may queue up between the source and the relay before the source
/// starts waiting on delivery
const EVENT_QUEUE_SIZE: usize = 16;

const PERMISSION_DENIED_NOTICE: &str =
    "Location access was denied. Please allow location access in your system settings and restart tracking.";

struct ActiveWatch {
    handle: WatchHandle,
    cancel: CancellationToken,
}

/// Bridges a [PositionSource] to a [ReportingClient]: every fix is appended to an
/// in-memory buffer for UI consumption and forwarded to the reporting endpoint.
/// Forwards are fire-and-forget and never block receipt of the next event, so
/// several sends may be in flight at once. They are started in the order the fixes
/// arrived, completion order is not guaranteed. The initiation-order guarantee
/// assumes the single-threaded cooperative runtime the tracker runs on, where
/// spawned forwards get their first poll in spawn order; a multi-thread executor
/// only guarantees spawn order, not first-poll order.
pub struct LocationRelay<S: PositionSource, R: ReportingClient, U: StateUpdateSender, N: Notifier> {
    source: S,
    reporter: Arc<R>,
    update_sender: U,
    notifier: Arc<N>,
    options: WatchOptions,
    buffer: RwLock<Vec<Position>>,
    watch: Mutex<Option<ActiveWatch>>,
}

impl<S, R, U, N> LocationRelay<S, R, U, N>
where
    S: PositionSource + 'static,
    R: ReportingClient + 'static,
    U: StateUpdateSender + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        source: S,
        reporter: Arc<R>,
        update_sender: U,
        notifier: Arc<N>,
        options: WatchOptions,
    ) -> Self {
        Self {
            source,
            reporter,
            update_sender,
            notifier,
            options,
            buffer: RwLock::new(Vec::new()),
            watch: Mutex::new(None),
        }
    }

    /// Begin watching the position source. Idempotent, calling while already active
    /// keeps the existing watch and never creates a second one.
    pub async fn start(self: &Arc<Self>) -> Result {
        let mut watch = self.watch.lock().await;

        if watch.is_some() {
            warn!("Location relay already watching, ignoring start");
            return Ok(());
        }

        let (events, rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        let handle = self
            .source
            .watch(self.options.clone(), events)
            .await
            .context("Failed to start watching location")?;

        let cancel = CancellationToken::new();
        *watch = Some(ActiveWatch {
            handle,
            cancel: cancel.clone(),
        });
        drop(watch);

        info!("Location watching started");

        let relay = self.clone();
        tokio::spawn(async move {
            relay.event_loop(handle, rx, cancel).await;
        });

        Ok(())
    }

    /// Stop watching and release the handle. Calling while inactive is a no-op.
    /// Report sends already dispatched are not cancelled.
    pub async fn stop(&self) {
        let mut watch = self.watch.lock().await;

        let Some(active) = watch.take() else {
            return;
        };
        drop(watch);

        self.halt(active).await;
    }

    /// Teardown path for the event loop itself, must not touch a watch created by a
    /// later start()
    async fn stop_if_current(&self, handle: WatchHandle) {
        let mut watch = self.watch.lock().await;

        let Some(active) = watch.take_if(|active| active.handle == handle) else {
            return;
        };
        drop(watch);

        self.halt(active).await;
    }

    async fn halt(&self, active: ActiveWatch) {
        active.cancel.cancel();
        self.source.clear_watch(active.handle).await;
        info!("Location watching stopped");
    }

    pub async fn is_active(&self) -> bool {
        self.watch.lock().await.is_some()
    }

    /// Snapshot of every fix received since this relay was created, in arrival order.
    /// The buffer is append-only and grows unbounded for the life of the relay.
    pub async fn positions(&self) -> Vec<Position> {
        self.buffer.read().await.clone()
    }

    async fn event_loop(
        self: Arc<Self>,
        handle: WatchHandle,
        mut rx: mpsc::Receiver<LocationEvent>,
        cancel: CancellationToken,
    ) {
        'events: loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    break 'events;
                }

                event = rx.recv() => {
                    match event {
                        Some(event) => {
                            if self.consume_event(event).await {
                                break 'events;
                            }
                        }
                        None => {
                            warn!("Position source closed the event stream");
                            break 'events;
                        }
                    }
                }
            }
        }

        // Covers the stream-closed and fatal-error exits, a no-op after stop()
        self.stop_if_current(handle).await;
    }

    /// Handle one event from the source. Returns whether the event loop should end.
    async fn consume_event(&self, event: LocationEvent) -> bool {
        match event {
            LocationEvent::Update(position) => {
                self.consume_update(position).await;
                false
            }
            LocationEvent::Failed { code, message } => self.consume_failure(code, &message),
        }
    }

    async fn consume_update(&self, mut position: Position) {
        if position.timestamp.is_none() {
            position.timestamp = Some(Utc::now());
        }

        debug!(
            "Live location: {}, {}",
            position.latitude, position.longitude
        );

        let mut buffer = self.buffer.write().await;
        buffer.push(position);
        drop(buffer);

        self.update_sender.send_update();

        let payload = LocationPayload::from(&position);
        let reporter = self.reporter.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match reporter.send(payload).await {
                Ok(()) => {
                    debug!("Location reported");
                }
                Err(why) => {
                    error!("Failed to report location: {why}");
                    notifier.notify(&why.to_string());
                }
            }
        });
    }

    fn consume_failure(&self, code: WatchErrorCode, message: &str) -> bool {
        if code.is_fatal() {
            error!("Error watching location ({}): {message}", code.code());
            self.notifier.notify(PERMISSION_DENIED_NOTICE);
            true
        } else {
            // The watch itself is still alive, later events are expected
            warn!("Error watching location ({}): {message}", code.code());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{
        CountingSender, MockReporter, MockSource, RecordingNotifier, wait_until,
    };
    use crate::report::ReportError;
    use tokio::{task::yield_now, test};

    type TestRelay = LocationRelay<MockSource, MockReporter, CountingSender, RecordingNotifier>;

    struct Fixture {
        relay: Arc<TestRelay>,
        source: MockSource,
        reporter: MockReporter,
        updates: CountingSender,
        notifier: RecordingNotifier,
    }

    fn fixture() -> Fixture {
        let source = MockSource::default();
        let reporter = MockReporter::default();
        let updates = CountingSender::default();
        let notifier = RecordingNotifier::default();

        let relay = Arc::new(TestRelay::new(
            source.clone(),
            Arc::new(reporter.clone()),
            updates.clone(),
            Arc::new(notifier.clone()),
            WatchOptions::default(),
        ));

        Fixture {
            relay,
            source,
            reporter,
            updates,
            notifier,
        }
    }

    #[test]
    async fn forwards_fixes_in_order_with_matching_payloads() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");

        f.source.emit(LocationEvent::Update(Position::new(37.0, -122.0))).await;
        f.source.emit(LocationEvent::Update(Position::new(37.1, -122.1))).await;
        f.source.emit(LocationEvent::Update(Position::new(37.2, -122.2))).await;

        wait_until(|| f.reporter.sent().len() == 3).await;

        let sent = f.reporter.sent();
        assert_eq!(sent[0], LocationPayload::from(&Position::new(37.0, -122.0)));
        assert_eq!(sent[1], LocationPayload::from(&Position::new(37.1, -122.1)));
        assert_eq!(sent[2], LocationPayload::from(&Position::new(37.2, -122.2)));
    }

    #[test]
    async fn start_is_idempotent() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");
        f.relay.start().await.expect("Failed to start again");

        assert_eq!(f.source.watch_count(), 1);
        assert!(f.relay.is_active().await);
    }

    #[test]
    async fn stop_while_inactive_is_a_noop() {
        let f = fixture();

        f.relay.stop().await;

        assert!(!f.relay.is_active().await);
        assert!(f.source.cleared().is_empty());
    }

    #[test]
    async fn stop_releases_the_watch() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");
        let handle = f.source.active_watch().expect("No active watch");

        f.relay.stop().await;

        assert!(!f.relay.is_active().await);
        assert_eq!(f.source.cleared(), vec![handle]);
    }

    #[test]
    async fn no_sends_after_stop() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");

        f.source.emit(LocationEvent::Update(Position::new(1.0, 2.0))).await;
        f.source.emit(LocationEvent::Update(Position::new(3.0, 4.0))).await;
        wait_until(|| f.reporter.sent().len() == 2).await;

        f.relay.stop().await;
        // The mock drops its sender on clear_watch, so this emit goes nowhere,
        // matching a platform source that stops delivering once unwatched
        f.source.emit(LocationEvent::Update(Position::new(5.0, 6.0))).await;

        for _ in 0..20 {
            yield_now().await;
        }
        assert_eq!(f.reporter.sent().len(), 2);
    }

    #[test]
    async fn permission_denied_never_reaches_the_reporter() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");
        let handle = f.source.active_watch().expect("No active watch");

        f.source
            .emit(LocationEvent::Failed {
                code: WatchErrorCode::PermissionDenied,
                message: "User denied Geolocation".into(),
            })
            .await;

        wait_until(|| !f.source.cleared().is_empty()).await;

        assert!(f.reporter.sent().is_empty());
        assert_eq!(f.source.cleared(), vec![handle]);
        assert!(!f.relay.is_active().await);
        let notices = f.notifier.messages();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("system settings"));
    }

    #[test]
    async fn non_fatal_errors_keep_the_watch_alive() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");

        f.source
            .emit(LocationEvent::Failed {
                code: WatchErrorCode::PositionUnavailable,
                message: "No fix".into(),
            })
            .await;
        f.source
            .emit(LocationEvent::Failed {
                code: WatchErrorCode::Timeout,
                message: "Timed out".into(),
            })
            .await;
        f.source.emit(LocationEvent::Update(Position::new(9.0, 9.0))).await;

        wait_until(|| f.reporter.sent().len() == 1).await;

        assert!(f.relay.is_active().await);
        assert!(f.source.cleared().is_empty());
        assert!(f.notifier.messages().is_empty());
    }

    #[test]
    async fn buffer_keeps_arrival_order_and_signals_updates() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");

        f.source.emit(LocationEvent::Update(Position::new(1.0, 1.0))).await;
        f.source.emit(LocationEvent::Update(Position::new(2.0, 2.0))).await;

        wait_until(|| f.updates.count() == 2).await;

        let positions = f.relay.positions().await;
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].latitude, 1.0);
        assert_eq!(positions[1].latitude, 2.0);
    }

    #[test]
    async fn stamps_receipt_time_when_source_has_none() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");

        f.source.emit(LocationEvent::Update(Position::new(1.0, 1.0))).await;
        wait_until(|| f.updates.count() == 1).await;

        let positions = f.relay.positions().await;
        assert!(positions[0].timestamp.is_some());
    }

    #[test]
    async fn report_failure_surfaces_the_mapped_notice_once() {
        let f = fixture();
        f.reporter.fail_with(ReportError::Server);
        f.relay.start().await.expect("Failed to start");

        f.source.emit(LocationEvent::Update(Position::new(37.0, -122.0))).await;

        wait_until(|| !f.notifier.messages().is_empty()).await;

        let notices = f.notifier.messages();
        assert_eq!(notices, vec!["Server error. Please try again later.".to_string()]);
        // The failed fix stays in the local buffer, it's only lost server-side
        assert_eq!(f.relay.positions().await.len(), 1);
    }

    #[test]
    async fn restart_after_stop_creates_a_fresh_watch() {
        let f = fixture();
        f.relay.start().await.expect("Failed to start");
        f.relay.stop().await;
        f.relay.start().await.expect("Failed to restart");

        assert_eq!(f.source.watch_count(), 2);
        assert!(f.relay.is_active().await);
    }
}
