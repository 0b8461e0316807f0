mod location;
mod permissions;
mod relay;
mod report;
mod shell;
mod source;

pub use location::{Coordinate, LocationEvent, Position, UtcDT, WatchErrorCode, WatchHandle};
pub use permissions::{PermissionKind, PermissionState, Permissions, request_permission};
pub use relay::{LocationRelay, StateUpdateSender};
pub use report::{LocationPayload, ReportError, ReportingClient, classify_status};
pub use shell::{Notifier, TrackerShell};
pub use source::{PositionSource, WatchOptions};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
