use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::{Coordinate, Position};

/// JSON body POSTed to the report endpoint for every forwarded fix. The optional
/// fields are omitted entirely when the source didn't report them, so a bare
/// foreground fix serializes to just `{"latitude":…,"longitude":…}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationPayload {
    pub latitude: Coordinate,
    pub longitude: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<Coordinate>,
}

impl From<&Position> for LocationPayload {
    fn from(position: &Position) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: position.accuracy,
            altitude: position.altitude,
            speed: position.speed,
            heading: position.heading,
        }
    }
}

/// User-facing failure categories for a report send. The Display text is exactly what
/// gets surfaced in the blocking notice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Unable to connect to the server. Please check your internet connection.")]
    NetworkUnreachable,
    #[error("Server error. Please try again later.")]
    Server,
    #[error("There was an issue with the request. Please check the data and try again.")]
    BadRequest,
    #[error("An error occurred while processing your request. Please try again later.")]
    Generic,
}

/// Map an HTTP outcome onto a [ReportError]. `None` means the request never got a
/// response (unreachable host, refused connection, dropped transport), which the
/// platform convention reports as status 0.
pub fn classify_status(status: Option<u16>) -> ReportError {
    match status {
        None | Some(0) => ReportError::NetworkUnreachable,
        Some(500..=599) => ReportError::Server,
        Some(400) => ReportError::BadRequest,
        Some(_) => ReportError::Generic,
    }
}

/// Outbound sender for location payloads. One request per call, fire-and-forget: no
/// retry, no backoff, no queuing. A payload that fails to send is gone from the
/// server's point of view.
pub trait ReportingClient: Send + Sync {
    fn send(
        &self,
        payload: LocationPayload,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;
}
