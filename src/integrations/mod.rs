//! External collaborators consumed through traits.

pub mod geolocation;

pub use geolocation::{
    GeolocationError, GeolocationProvider, LocationOverlay, LocationTracker, Position,
    PositionOptions, PositionStream, TrackingState,
};
