use std::sync::Arc;

use log::{info, warn};

use crate::{
    permissions::{PermissionKind, Permissions, request_permission},
    prelude::*,
    relay::{LocationRelay, StateUpdateSender},
    report::ReportingClient,
    source::PositionSource,
};

/// Blocking, user-visible notice. App shells map this to a native dialog, headless
/// runs degrade it to a log line.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

const NOTIFICATIONS_DENIED_NOTICE: &str =
    "Background tracking needs notification access. Please allow notifications in your system settings and try again.";

/// Owns the tracking lifecycle: permission gating on startup, relay teardown on the
/// way out. Native (background-capable) environments must get the notification
/// permission granted before the relay starts, web-style environments skip the gate.
pub struct TrackerShell<S, R, U, N, P>
where
    S: PositionSource + 'static,
    R: ReportingClient + 'static,
    U: StateUpdateSender + 'static,
    N: Notifier + 'static,
    P: Permissions,
{
    relay: Arc<LocationRelay<S, R, U, N>>,
    permissions: P,
    notifier: Arc<N>,
    native: bool,
}

impl<S, R, U, N, P> TrackerShell<S, R, U, N, P>
where
    S: PositionSource + 'static,
    R: ReportingClient + 'static,
    U: StateUpdateSender + 'static,
    N: Notifier + 'static,
    P: Permissions,
{
    pub fn new(
        relay: Arc<LocationRelay<S, R, U, N>>,
        permissions: P,
        notifier: Arc<N>,
        native: bool,
    ) -> Self {
        Self {
            relay,
            permissions,
            notifier,
            native,
        }
    }

    /// Bring tracking up. Returns whether it actually started, a permission denial
    /// blocks startup for the rest of the session and surfaces a notice.
    pub async fn startup(&self) -> Result<bool> {
        if self.native
            && !request_permission(&self.permissions, PermissionKind::Notifications).await
        {
            warn!("Notification permission denied, not starting the relay");
            self.notifier.notify(NOTIFICATIONS_DENIED_NOTICE);
            return Ok(false);
        }

        self.relay.start().await?;
        info!("Tracker started");
        Ok(true)
    }

    /// Always called on the way out, releases the watch and any UI observers'
    /// reason to keep polling
    pub async fn teardown(&self) {
        self.relay.stop().await;
        info!("Tracker stopped");
    }

    pub fn relay(&self) -> &Arc<LocationRelay<S, R, U, N>> {
        &self.relay
    }
}
