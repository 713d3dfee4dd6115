// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Device location tracking.
//!
//! A [`GeolocationTracker`] owns one continuous location subscription that
//! runs on a background thread until the tracker is dropped. Every update
//! replaces the previous position wholesale; provider errors are logged and
//! leave the last known position untouched.
//!
//! "Center on me" uses [`request_once`] when the tracker has no fix yet.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Rough accuracy of IP-based geolocation, in meters.
const IP_ACCURACY_METERS: f64 = 5000.0;

/// Callback used to wake the UI after a location update.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Latest known device position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserPosition {
    pub lat: f64,
    pub lng: f64,
    /// Radius of the 68% confidence circle, in meters.
    pub accuracy: f64,
}

/// A single location reading and when it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub position: UserPosition,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    #[must_use]
    pub fn now(position: UserPosition) -> Self {
        Self {
            position,
            timestamp: Utc::now(),
        }
    }

    /// Time since the reading was taken. Readings from the future count as fresh.
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.timestamp).to_std().unwrap_or_default()
    }
}

/// Reasons a location request can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("timed out waiting for a position")]
    Timeout,

    #[error("location is not supported on this device")]
    Unsupported,
}

impl LocationError {
    /// Message shown to the user when an explicit request fails.
    #[must_use]
    pub fn alert_text(&self) -> String {
        match self {
            Self::PermissionDenied => "Permiso de ubicación denegado.".to_string(),
            Self::PositionUnavailable(reason) => format!("No se pudo obtener la ubicación ({reason})."),
            Self::Timeout => "Se agotó el tiempo de espera de la ubicación.".to_string(),
            Self::Unsupported => "Este dispositivo no ofrece ubicación.".to_string(),
        }
    }
}

/// Options applied to every location request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Cached fixes younger than this are reused instead of asking the provider.
    pub maximum_age: Duration,
    /// Upper bound for a single fix attempt.
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Source of device positions.
///
/// `locate` may block; it is always called off the UI thread.
pub trait LocationProvider: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether this provider can ever produce a position.
    fn is_available(&self) -> bool {
        true
    }

    fn locate(&self, options: &PositionOptions) -> Result<UserPosition, LocationError>;
}

/// IP-based geolocation through public lookup services.
#[derive(Debug, Default)]
pub struct IpLocationProvider;

impl IpLocationProvider {
    fn lookup(
        client: &reqwest::blocking::Client,
        url: &str,
        lat_key: &str,
        lng_key: &str,
    ) -> Result<UserPosition, LocationError> {
        let response = client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::PositionUnavailable(e.to_string())
            }
        })?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(LocationError::PermissionDenied);
        }
        if !response.status().is_success() {
            return Err(LocationError::PositionUnavailable(format!("HTTP {}", response.status())));
        }

        let value: serde_json::Value = response
            .json()
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))?;

        match (
            value.get(lat_key).and_then(serde_json::Value::as_f64),
            value.get(lng_key).and_then(serde_json::Value::as_f64),
        ) {
            (Some(lat), Some(lng)) => Ok(UserPosition {
                lat,
                lng,
                accuracy: IP_ACCURACY_METERS,
            }),
            _ => Err(LocationError::PositionUnavailable(format!("no coordinates from {url}"))),
        }
    }
}

impl LocationProvider for IpLocationProvider {
    fn name(&self) -> &'static str {
        "ip"
    }

    fn locate(&self, options: &PositionOptions) -> Result<UserPosition, LocationError> {
        if options.high_accuracy {
            debug!("High accuracy requested; IP lookup can only give a coarse position");
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))?;

        // Try ipapi.co first, then ip-api.com (no API key needed)
        Self::lookup(&client, "https://ipapi.co/json/", "latitude", "longitude").or_else(|e| {
            debug!("ipapi.co lookup failed: {e}");
            Self::lookup(&client, "http://ip-api.com/json/", "lat", "lon")
        })
    }
}

/// A fixed position, for devices without any location hardware.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    pub position: UserPosition,
}

impl LocationProvider for FixedLocationProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn locate(&self, _options: &PositionOptions) -> Result<UserPosition, LocationError> {
        Ok(self.position)
    }
}

/// No location capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl LocationProvider for Unavailable {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn locate(&self, _options: &PositionOptions) -> Result<UserPosition, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Get a fix, reusing `cached` when it is younger than `maximum_age`.
async fn acquire(
    provider: Arc<dyn LocationProvider>,
    options: PositionOptions,
    cached: Option<Fix>,
) -> Result<Fix, LocationError> {
    if let Some(fix) = cached.filter(|fix| fix.age() <= options.maximum_age) {
        return Ok(fix);
    }

    let attempt = tokio::task::spawn_blocking(move || provider.locate(&options));
    match tokio::time::timeout(options.timeout, attempt).await {
        Ok(Ok(result)) => result.map(Fix::now),
        Ok(Err(join_error)) => Err(LocationError::PositionUnavailable(join_error.to_string())),
        Err(_elapsed) => Err(LocationError::Timeout),
    }
}

/// Last-write-wins update of the shared fix. Errors never clear it.
fn apply_update(latest: &RwLock<Option<Fix>>, update: Result<Fix, LocationError>) -> bool {
    match update {
        Ok(fix) => {
            if let Ok(mut slot) = latest.write() {
                *slot = Some(fix);
            }
            true
        }
        Err(e) => {
            warn!("Location update failed: {e}");
            false
        }
    }
}

async fn run_watch(
    provider: Arc<dyn LocationProvider>,
    options: PositionOptions,
    interval: Duration,
    latest: Arc<RwLock<Option<Fix>>>,
    cancel: CancellationToken,
    notify: Notify,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // Cancellation is polled first so no provider call starts after teardown
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let cached = latest.read().ok().and_then(|slot| *slot);
        let update = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            update = acquire(Arc::clone(&provider), options, cached) => update,
        };
        if apply_update(&latest, update) {
            notify();
        }
    }
    debug!("Location watch stopped");
}

/// Continuous location subscription with the latest fix.
pub struct GeolocationTracker {
    latest: Arc<RwLock<Option<Fix>>>,
    available: bool,
    cancel: CancellationToken,
}

impl std::fmt::Debug for GeolocationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeolocationTracker")
            .field("available", &self.available)
            .field("position", &self.position())
            .finish_non_exhaustive()
    }
}

impl GeolocationTracker {
    /// Start watching `provider`. The subscription lives until the tracker is dropped.
    #[must_use]
    pub fn watch(
        provider: Arc<dyn LocationProvider>,
        options: PositionOptions,
        interval: Duration,
        notify: Notify,
    ) -> Self {
        let tracker = Self {
            latest: Arc::new(RwLock::new(None)),
            available: provider.is_available(),
            cancel: CancellationToken::new(),
        };

        if !tracker.available {
            info!("No location capability ({}); position stays empty", provider.name());
            return tracker;
        }

        info!("Starting location watch using {} provider", provider.name());
        let latest = Arc::clone(&tracker.latest);
        let cancel = tracker.cancel.clone();
        std::thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to start location runtime: {e}");
                    return;
                }
            };
            runtime.block_on(run_watch(provider, options, interval, latest, cancel, notify));
        });

        tracker
    }

    /// Latest known position, if any.
    #[must_use]
    pub fn position(&self) -> Option<UserPosition> {
        self.latest
            .read()
            .ok()
            .and_then(|slot| slot.map(|fix| fix.position))
    }

    /// False when the device cannot produce positions at all.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Record a result obtained outside the subscription, such as a one-shot request.
    pub fn record_update(&self, update: Result<UserPosition, LocationError>) {
        apply_update(&self.latest, update.map(Fix::now));
    }
}

impl Drop for GeolocationTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Pending one-shot location request.
#[derive(Debug)]
pub struct OneShot {
    rx: oneshot::Receiver<Result<UserPosition, LocationError>>,
}

impl OneShot {
    /// `Some` once the request has finished.
    pub fn poll(&mut self) -> Option<Result<UserPosition, LocationError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(LocationError::PositionUnavailable(
                "request abandoned".to_string(),
            ))),
        }
    }
}

/// Ask `provider` for a single fresh position in the background.
pub fn request_once(provider: Arc<dyn LocationProvider>, options: PositionOptions, notify: Notify) -> OneShot {
    let (tx, rx) = oneshot::channel();

    if !provider.is_available() {
        // Receiver is still alive; send cannot fail here
        let _ = tx.send(Err(LocationError::Unsupported));
        return OneShot { rx };
    }

    std::thread::spawn(move || {
        let result = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime
                .block_on(acquire(provider, options, None))
                .map(|fix| fix.position),
            Err(e) => Err(LocationError::PositionUnavailable(e.to_string())),
        };
        if tx.send(result).is_err() {
            debug!("One-shot location request dropped before completion");
        }
        notify();
    });

    OneShot { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const LIMA: UserPosition = UserPosition {
        lat: -12.0464,
        lng: -77.0428,
        accuracy: 12.0,
    };

    /// Replays a script of results, then keeps failing.
    struct Scripted {
        script: Mutex<Vec<Result<UserPosition, LocationError>>>,
    }

    impl Scripted {
        fn new(mut script: Vec<Result<UserPosition, LocationError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    impl LocationProvider for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn locate(&self, _options: &PositionOptions) -> Result<UserPosition, LocationError> {
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(LocationError::PositionUnavailable("script exhausted".to_string())))
        }
    }

    fn noop() -> Notify {
        Arc::new(|| {})
    }

    #[test]
    fn test_error_keeps_last_fix() {
        let tracker = GeolocationTracker::watch(Arc::new(Unavailable), PositionOptions::default(), Duration::from_secs(1), noop());
        tracker.record_update(Ok(LIMA));
        tracker.record_update(Err(LocationError::Timeout));
        assert_eq!(tracker.position(), Some(LIMA));
    }

    #[test]
    fn test_last_update_wins() {
        let tracker = GeolocationTracker::watch(Arc::new(Unavailable), PositionOptions::default(), Duration::from_secs(1), noop());
        let moved = UserPosition { lat: -12.1, ..LIMA };
        tracker.record_update(Ok(LIMA));
        tracker.record_update(Ok(moved));
        assert_eq!(tracker.position(), Some(moved));
    }

    #[test]
    fn test_unavailable_provider() {
        let tracker = GeolocationTracker::watch(Arc::new(Unavailable), PositionOptions::default(), Duration::from_secs(1), noop());
        assert!(!tracker.is_available());
        assert_eq!(tracker.position(), None);
    }

    #[tokio::test]
    async fn test_watch_fix_then_error() {
        let provider: Arc<dyn LocationProvider> = Arc::new(Scripted::new(vec![Ok(LIMA), Err(LocationError::Timeout)]));
        let latest = Arc::new(RwLock::new(None));
        let cancel = CancellationToken::new();
        let options = PositionOptions {
            maximum_age: Duration::ZERO,
            ..PositionOptions::default()
        };

        let task = tokio::spawn(run_watch(
            provider,
            options,
            Duration::from_millis(10),
            Arc::clone(&latest),
            cancel.clone(),
            noop(),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        task.await.unwrap();

        let position = latest.read().unwrap().map(|fix| fix.position);
        assert_eq!(position, Some(LIMA));
    }

    /// Counts `locate` calls and takes a while to answer.
    struct Slow {
        calls: Arc<AtomicUsize>,
    }

    impl LocationProvider for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn locate(&self, _options: &PositionOptions) -> Result<UserPosition, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(60));
            Ok(LIMA)
        }
    }

    #[test]
    fn test_dropped_tracker_starts_no_more_lookups() {
        let options = PositionOptions {
            maximum_age: Duration::ZERO,
            ..PositionOptions::default()
        };
        for _ in 0..10 {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = Arc::new(Slow {
                calls: Arc::clone(&calls),
            });
            let tracker = GeolocationTracker::watch(provider, options, Duration::from_millis(5), noop());

            // Let a lookup get in flight, then tear down
            std::thread::sleep(Duration::from_millis(90));
            drop(tracker);
            std::thread::sleep(Duration::from_millis(20));
            let at_drop = calls.load(Ordering::SeqCst);
            assert!(at_drop >= 1);

            std::thread::sleep(Duration::from_millis(300));
            assert_eq!(calls.load(Ordering::SeqCst), at_drop);
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_is_reused() {
        let provider: Arc<dyn LocationProvider> = Arc::new(Unavailable);
        let cached = Fix::now(LIMA);
        let fix = acquire(provider, PositionOptions::default(), Some(cached)).await.unwrap();
        assert_eq!(fix, cached);
    }

    #[tokio::test]
    async fn test_stale_cache_asks_provider() {
        let provider: Arc<dyn LocationProvider> = Arc::new(Unavailable);
        let stale = Fix {
            position: LIMA,
            timestamp: Utc::now() - chrono::Duration::seconds(30),
        };
        let result = acquire(provider, PositionOptions::default(), Some(stale)).await;
        assert_eq!(result, Err(LocationError::Unsupported));
    }

    #[test]
    fn test_one_shot_fixed_provider() {
        let provider = Arc::new(FixedLocationProvider { position: LIMA });
        let mut request = request_once(provider, PositionOptions::default(), noop());
        let started = std::time::Instant::now();
        let result = loop {
            if let Some(result) = request.poll() {
                break result;
            }
            assert!(started.elapsed() < Duration::from_secs(5));
            std::thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(result, Ok(LIMA));
    }

    #[test]
    fn test_one_shot_unavailable() {
        let mut request = request_once(Arc::new(Unavailable), PositionOptions::default(), noop());
        assert_eq!(request.poll(), Some(Err(LocationError::Unsupported)));
    }
}
