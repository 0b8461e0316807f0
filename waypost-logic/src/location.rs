use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A "part" of a position
pub type Coordinate = f64;

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// A single GPS fix as gotten from a Geolocation API
pub struct Position {
    /// Latitude
    pub latitude: Coordinate,
    /// Longitude
    pub longitude: Coordinate,
    /// Horizontal accuracy radius in meters, optional as not every source reports it
    pub accuracy: Option<Coordinate>,
    /// Altitude in meters above the ellipsoid
    pub altitude: Option<Coordinate>,
    /// Ground speed in meters per second
    pub speed: Option<Coordinate>,
    /// The bearing in degrees clockwise from north, optional as GPS can't always determine
    pub heading: Option<Coordinate>,
    /// When the fix was captured, filled with the receipt time by the relay when the
    /// source doesn't provide one
    pub timestamp: Option<UtcDT>,
}

impl Position {
    pub fn new(latitude: Coordinate, longitude: Coordinate) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            speed: None,
            heading: None,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Why a watch failed to deliver a fix
pub enum WatchErrorCode {
    /// The user has denied the request for geolocation access
    PermissionDenied,
    /// The device is unable to retrieve the location (GPS disabled, indoors with no
    /// signal, or the network cannot fetch the location)
    PositionUnavailable,
    /// The request to fetch the location took too long and timed out
    Timeout,
}

impl WatchErrorCode {
    /// Numeric code in the platform geolocation convention
    pub fn code(self) -> u8 {
        match self {
            Self::PermissionDenied => 1,
            Self::PositionUnavailable => 2,
            Self::Timeout => 3,
        }
    }

    /// Whether the watch is worth keeping alive after this error. Only a permission
    /// denial is terminal, the other codes are expected to clear up on their own.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

/// A single delivery from a position watch, either a fix or a classified error.
/// Exactly one of the two is ever populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LocationEvent {
    /// A new fix from the source
    Update(Position),
    /// The source failed to produce a fix
    Failed {
        code: WatchErrorCode,
        message: String,
    },
}

/// Identifier for an active watch on a [PositionSource](crate::PositionSource),
/// held until the watch is explicitly cleared
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WatchHandle(Uuid);

impl WatchHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WatchHandle {
    fn default() -> Self {
        Self::new()
    }
}
