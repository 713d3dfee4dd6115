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

//! Map renderer state.
//!
//! Everything the map view decides that does not depend on the widget itself:
//! the fullscreen flag and its name filter, when to rebuild the map instance,
//! "center on me" handling and the fly-to animation.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::fuzzy::{contains_ignore_case, matches_ignore_case};
use crate::geolocation::{request_once, LocationError, LocationProvider, Notify, OneShot, PositionOptions, UserPosition};
use crate::record::HouseholdRecord;

/// Zoom level used when centering on the user.
pub const RECENTER_ZOOM: f64 = 17.0;

/// Duration of the fly-to animation.
pub const FLY_DURATION: Duration = Duration::from_millis(800);

/// Animated camera move from one view to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub from: (f64, f64),
    pub from_zoom: f64,
    pub to: (f64, f64),
    pub to_zoom: f64,
    pub duration: Duration,
}

/// Camera position at one instant of a [`FlyTo`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    pub center: (f64, f64),
    pub zoom: f64,
    pub finished: bool,
}

impl FlyTo {
    /// Camera after `elapsed` has passed, with cubic ease-in-out.
    #[must_use]
    pub fn sample(&self, elapsed: Duration) -> CameraSample {
        let total = self.duration.as_secs_f64();
        let t = if total <= 0.0 {
            1.0
        } else {
            (elapsed.as_secs_f64() / total).clamp(0.0, 1.0)
        };
        let eased = if t < 0.5 {
            4.0 * t * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
        };
        let lerp = |a: f64, b: f64| a + (b - a) * eased;

        CameraSample {
            center: (lerp(self.from.0, self.to.0), lerp(self.from.1, self.to.1)),
            zoom: lerp(self.from_zoom, self.to_zoom),
            finished: t >= 1.0,
        }
    }
}

/// What "center on me" should do right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recenter {
    /// Animate to this position at [`RECENTER_ZOOM`].
    FlyTo { lat: f64, lng: f64 },
    /// A one-shot location request has been issued.
    Requested,
    /// The device has no location capability.
    Unavailable,
}

/// Identity of a map widget instance. A change means a fresh instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapInstanceKey {
    pub point_count: usize,
    pub fullscreen: bool,
}

/// A single popup line for a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupField<'a> {
    HeadName(&'a str),
    Address(&'a str),
    Phone { number: &'a str, link: String },
    Dni(&'a str),
    Notes(&'a str),
}

/// Popup contents for a marker, leaving out empty fields.
#[must_use]
pub fn popup_fields(record: &HouseholdRecord) -> Vec<PopupField<'_>> {
    let mut fields = vec![PopupField::HeadName(record.display_name())];
    if !record.address.is_empty() {
        fields.push(PopupField::Address(&record.address));
    }
    if let Some(link) = record.phone_link() {
        fields.push(PopupField::Phone {
            number: &record.phone,
            link,
        });
    }
    if !record.dni.is_empty() {
        fields.push(PopupField::Dni(&record.dni));
    }
    if !record.notes.is_empty() {
        fields.push(PopupField::Notes(&record.notes));
    }
    fields
}

/// State owned by the map view.
#[derive(Debug, Default)]
pub struct MapViewState {
    fullscreen: bool,
    /// Name filter shown only while fullscreen.
    pub fullscreen_query: String,
    instance: Option<MapInstanceKey>,
    generation: u64,
    pending: Option<OneShot>,
    alert: Option<String>,
}

impl MapViewState {
    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Page scrolling is disabled while the map is fullscreen.
    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.fullscreen
    }

    /// Flip fullscreen. Either direction clears the fullscreen query.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen_query.clear();
        self.fullscreen
    }

    /// Leave fullscreen (Escape key). Returns true if anything changed.
    pub fn exit_fullscreen(&mut self) -> bool {
        if !self.fullscreen {
            return false;
        }
        self.toggle_fullscreen();
        true
    }

    /// Points to draw: all records, or the name-filtered ones while fullscreen.
    #[must_use]
    pub fn visible_points<'a>(&self, records: &'a [HouseholdRecord]) -> Vec<&'a HouseholdRecord> {
        if self.fullscreen {
            contains_ignore_case(records, "headName", &self.fullscreen_query)
        } else {
            records.iter().collect()
        }
    }

    /// Same selection as [`Self::visible_points`], as indices into `records`.
    #[must_use]
    pub fn visible_indices(&self, records: &[HouseholdRecord]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| !self.fullscreen || matches_ignore_case(&r.head_name, &self.fullscreen_query))
            .map(|(i, _)| i)
            .collect()
    }

    /// Record the current instance key; true when the widget must be rebuilt.
    pub fn needs_remount(&mut self, point_count: usize) -> bool {
        let key = MapInstanceKey {
            point_count,
            fullscreen: self.fullscreen,
        };
        if self.instance == Some(key) {
            return false;
        }
        debug!("Rebuilding map instance for {key:?}");
        self.instance = Some(key);
        self.generation += 1;
        true
    }

    /// Number of map instances created so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handle the "center on me" control.
    pub fn center_on_me(
        &mut self,
        current: Option<UserPosition>,
        provider: &Arc<dyn LocationProvider>,
        options: PositionOptions,
        notify: Notify,
    ) -> Recenter {
        if let Some(position) = current {
            return Recenter::FlyTo {
                lat: position.lat,
                lng: position.lng,
            };
        }
        if !provider.is_available() {
            return Recenter::Unavailable;
        }
        if self.pending.is_none() {
            self.pending = Some(request_once(Arc::clone(provider), options, notify));
        }
        Recenter::Requested
    }

    /// Check the one-shot request. Returns the fix on success; failures raise an alert.
    pub fn poll_request(&mut self) -> Option<UserPosition> {
        let result = self.pending.as_mut()?.poll()?;
        self.pending = None;
        self.resolve_request(result)
    }

    fn resolve_request(&mut self, result: Result<UserPosition, LocationError>) -> Option<UserPosition> {
        match result {
            Ok(position) => Some(position),
            Err(e) => {
                warn!("Center-on-me request failed: {e}");
                self.alert = Some(e.alert_text());
                None
            }
        }
    }

    #[must_use]
    pub fn is_requesting(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}
