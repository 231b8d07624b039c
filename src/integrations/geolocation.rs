use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{stream::BoxStream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::config::GeolocationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of the 95% confidence circle, in meters.
    pub accuracy_m: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation failed: {0}")]
    Other(String),
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => {
                "Location access denied. Please enable location permissions in your browser settings to see your position on campus."
            }
            GeolocationError::PositionUnavailable => {
                "Cannot determine your location. Please check your GPS/network connection and try again."
            }
            GeolocationError::Timeout => {
                "Location request timed out. Please ensure GPS is enabled and try again."
            }
            GeolocationError::Other(_) => {
                "Unable to get your location. Please check your device settings."
            }
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => "Permission denied",
            GeolocationError::PositionUnavailable => "Unavailable",
            GeolocationError::Timeout => "Timeout",
            GeolocationError::Other(_) => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// One-shot fix requested when tracking starts.
    pub fn initial(config: &GeolocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.initial_timeout(),
            maximum_age: config.initial_max_age(),
        }
    }

    pub fn watch(config: &GeolocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.watch_timeout(),
            maximum_age: config.watch_max_age(),
        }
    }
}

pub type PositionStream = BoxStream<'static, Result<Position, GeolocationError>>;

/// Device location source. Dropping a stream returned by `watch_position`
/// clears that watch.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self, options: PositionOptions) -> Result<Position, GeolocationError>;

    fn watch_position(&self, options: PositionOptions) -> PositionStream;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationOverlay {
    pub marker: Position,
    pub accuracy_circle_px: f64,
    /// Set on the fix that created the marker; the map recenters on it.
    pub recenter: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingState {
    pub status: String,
    pub is_tracking: bool,
    pub error_message: Option<String>,
    pub last_fix: Option<Position>,
    pub overlay: Option<LocationOverlay>,
    pub fixes: u64,
}

impl Default for TrackingState {
    fn default() -> Self {
        Self {
            status: "Idle".to_string(),
            is_tracking: false,
            error_message: None,
            last_fix: None,
            overlay: None,
            fixes: 0,
        }
    }
}

struct ActiveWatch {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveWatch {
    fn halt(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Drives a continuous location watch and publishes the marker overlay.
pub struct LocationTracker {
    provider: Arc<dyn GeolocationProvider>,
    config: GeolocationConfig,
    state: Arc<watch::Sender<TrackingState>>,
    active: Mutex<Option<ActiveWatch>>,
}

impl LocationTracker {
    pub fn new(provider: Arc<dyn GeolocationProvider>, config: GeolocationConfig) -> Self {
        let (state, _) = watch::channel(TrackingState::default());
        Self {
            provider,
            config,
            state: Arc::new(state),
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> TrackingState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Begin tracking. A running watch is replaced, which is how a retry
    /// after an error works. Must be called inside a tokio runtime.
    pub fn start(&self) {
        if !self.provider.is_supported() {
            tracing::warn!("Geolocation not supported");
            self.state.send_modify(|s| {
                s.status = "Not supported".to_string();
                s.is_tracking = false;
                s.error_message = Some("Geolocation is not supported on this device".to_string());
            });
            return;
        }

        self.stop();
        self.state.send_modify(|s| {
            s.status = "Requesting location...".to_string();
            s.error_message = None;
        });

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_watch(
            self.provider.clone(),
            self.config.clone(),
            self.state.clone(),
            cancel.clone(),
        ));

        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(ActiveWatch { cancel, task });
        tracing::info!("Location watch started");
    }

    /// Halt the watch. No callbacks are applied after this returns. Safe to
    /// call repeatedly or before `start`.
    pub fn stop(&self) {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(active) = active {
            active.halt();
            self.state.send_modify(|s| {
                s.is_tracking = false;
                s.status = "Tracking stopped".to_string();
            });
            tracing::info!("Location tracking stopped");
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        if let Some(active) = self.active.lock().unwrap_or_else(PoisonError::into_inner).take() {
            active.halt();
        }
    }
}

async fn run_watch(
    provider: Arc<dyn GeolocationProvider>,
    config: GeolocationConfig,
    state: Arc<watch::Sender<TrackingState>>,
    cancel: CancellationToken,
) {
    let initial = PositionOptions::initial(&config);
    let first_fix = tokio::select! {
        _ = cancel.cancelled() => return,
        fix = tokio::time::timeout(initial.timeout, provider.current_position(initial)) => fix,
    };
    match first_fix {
        Ok(Ok(position)) => apply_fix(&state, &cancel, position, config.min_accuracy_circle_px),
        Ok(Err(e)) => tracing::warn!("Could not get initial position: {}", e),
        Err(_) => tracing::warn!("Initial position request timed out"),
    }

    let mut positions = provider.watch_position(PositionOptions::watch(&config));
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = positions.next() => next,
        };
        match next {
            Some(Ok(position)) => apply_fix(&state, &cancel, position, config.min_accuracy_circle_px),
            Some(Err(e)) => apply_error(&state, &cancel, e),
            None => {
                tracing::debug!("Position stream ended");
                break;
            }
        }
    }
}

/// Marker diameter covers the accuracy radius on both sides, never below
/// the configured minimum.
pub fn accuracy_circle_px(accuracy_m: f64, min_px: f64) -> f64 {
    (accuracy_m * 2.0).max(min_px)
}

fn apply_fix(
    state: &watch::Sender<TrackingState>,
    cancel: &CancellationToken,
    position: Position,
    min_circle_px: f64,
) {
    state.send_if_modified(|s| {
        if cancel.is_cancelled() {
            return false;
        }
        let recenter = s.overlay.is_none();
        s.status = format!("Tracking (±{:.0}m)", position.accuracy_m);
        s.is_tracking = true;
        s.error_message = None;
        s.last_fix = Some(position);
        s.overlay = Some(LocationOverlay {
            marker: position,
            accuracy_circle_px: accuracy_circle_px(position.accuracy_m, min_circle_px),
            recenter,
        });
        s.fixes += 1;
        true
    });
    tracing::debug!(
        "Location updated: {:.6}, {:.6} accuracy {:.0}m",
        position.latitude,
        position.longitude,
        position.accuracy_m
    );
}

fn apply_error(state: &watch::Sender<TrackingState>, cancel: &CancellationToken, error: GeolocationError) {
    tracing::error!("Location error: {}", error);
    state.send_if_modified(|s| {
        if cancel.is_cancelled() {
            return false;
        }
        s.is_tracking = false;
        s.status = error.status_label().to_string();
        s.error_message = Some(error.user_message().to_string());
        true
    });
}
