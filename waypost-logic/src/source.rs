use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{
    location::{LocationEvent, WatchHandle},
    prelude::*,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Options passed to [PositionSource::watch]. The notification fields only matter to
/// background-capable sources, which show a persistent notification while tracking.
pub struct WatchOptions {
    /// Ask the source for the most accurate fix it can produce
    pub high_accuracy: bool,
    /// Title of the tracking notification (background sources only)
    pub notification_title: Option<String>,
    /// Body of the tracking notification (background sources only)
    pub notification_body: Option<String>,
    /// Let the source raise its own permission prompt when starting the watch
    pub request_permissions: bool,
    /// Accept cached readings the platform produced before the watch started
    pub allow_stale: bool,
    /// Minimum distance in meters between delivered fixes, 0 delivers everything
    pub minimum_distance_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            notification_title: None,
            notification_body: None,
            request_permissions: true,
            allow_stale: false,
            minimum_distance_m: 0.0,
        }
    }
}

/// Abstraction over a platform geolocation API. A watch delivers [LocationEvent]s
/// indefinitely until cleared, one event per update or per failed fix. Sources never
/// restart a watch on their own, non-fatal errors are followed by further events on
/// the same watch.
pub trait PositionSource: Send + Sync {
    /// Start delivering events into `events`. Returns the handle needed to stop the
    /// watch again.
    fn watch(
        &self,
        options: WatchOptions,
        events: mpsc::Sender<LocationEvent>,
    ) -> impl Future<Output = Result<WatchHandle>> + Send;

    /// Stop an active watch, after which no further events are delivered for it.
    /// Clearing a handle that is not active is a no-op.
    fn clear_watch(&self, handle: WatchHandle) -> impl Future<Output = ()> + Send;
}
