use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use waypost_logic::{
    LocationEvent, Position, PositionSource, WatchHandle, WatchOptions, prelude::*,
};

/// Degrees of offset for the simulated walk, roughly a 50m circle
const WALK_RADIUS_DEG: f64 = 0.0005;
/// Radians advanced per fix
const WALK_STEP: f64 = 0.1;
/// Typical walking pace in m/s
const WALK_SPEED: f64 = 1.4;

/// Position source that walks a small circle around a center point, one fix per
/// tick. Stands in for the platform geolocation API on headless runs.
pub struct ScriptedSource {
    center: (f64, f64),
    interval: Duration,
    active: Mutex<Option<(WatchHandle, CancellationToken)>>,
}

impl ScriptedSource {
    pub fn new(latitude: f64, longitude: f64, interval: Duration) -> Self {
        Self {
            center: (latitude, longitude),
            interval,
            active: Mutex::new(None),
        }
    }
}

fn walk_position(center: (f64, f64), step: u64, high_accuracy: bool) -> Position {
    let angle = step as f64 * WALK_STEP;

    Position {
        latitude: center.0 + WALK_RADIUS_DEG * angle.sin(),
        longitude: center.1 + WALK_RADIUS_DEG * angle.cos(),
        accuracy: Some(if high_accuracy { 5.0 } else { 25.0 }),
        altitude: None,
        speed: Some(WALK_SPEED),
        heading: Some((angle.to_degrees() + 90.0) % 360.0),
        timestamp: Some(Utc::now()),
    }
}

impl PositionSource for ScriptedSource {
    async fn watch(
        &self,
        options: WatchOptions,
        events: mpsc::Sender<LocationEvent>,
    ) -> Result<WatchHandle> {
        let mut active = self.active.lock().await;

        if active.is_some() {
            anyhow::bail!("Simulated source only supports one watch at a time");
        }

        let handle = WatchHandle::new();
        let cancel = CancellationToken::new();
        *active = Some((handle, cancel.clone()));

        let center = self.center;
        let interval = self.interval;
        let high_accuracy = options.high_accuracy;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut step = 0u64;

            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => break,

                    _ = ticker.tick() => {
                        let position = walk_position(center, step, high_accuracy);
                        step += 1;

                        if events.send(LocationEvent::Update(position)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(handle)
    }

    async fn clear_watch(&self, handle: WatchHandle) {
        let mut active = self.active.lock().await;

        if let Some((current, cancel)) = active.as_ref() {
            if *current == handle {
                cancel.cancel();
                *active = None;
            }
        }
    }
}
