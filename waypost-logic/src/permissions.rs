use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Result of a platform permission query. Never cached across launches, callers
/// re-query on every check.
pub enum PermissionState {
    Granted,
    Denied,
    /// The user hasn't been asked yet
    Prompt,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Location,
    /// Display permission for the persistent notification shown while tracking in the
    /// background
    Notifications,
}

/// Platform seam for OS-level permission dialogs
pub trait Permissions: Send + Sync {
    /// Query the current state without prompting the user
    fn check(&self, kind: PermissionKind) -> impl Future<Output = PermissionState> + Send;
    /// Raise the interactive permission prompt
    fn request(&self, kind: PermissionKind) -> impl Future<Output = PermissionState> + Send;
}

/// Gate a permission before use: check the current state first and only raise the
/// interactive prompt when it isn't already granted. Returns whether the permission
/// ended up granted. A denial is terminal for the session, the user has to change the
/// OS settings and start over.
pub async fn request_permission(perms: &impl Permissions, kind: PermissionKind) -> bool {
    let state = perms.check(kind).await;

    if state == PermissionState::Granted {
        return true;
    }

    debug!("Permission {kind:?} is {state:?}, prompting");
    perms.request(kind).await == PermissionState::Granted
}
