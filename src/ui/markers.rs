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

//! Walkers plugins for household markers and the user's location.

use std::sync::{Arc, Mutex};

use egui::{Color32, Pos2, Stroke};
use padron_core::mercator::WebMercator;
use padron_core::{ClusterSize, HouseholdRecord, LayerItem, MarkerLayer, ScreenPoint, UserPosition};
use walkers::{MapMemory, Plugin, Position, Projector};

/// Click tolerance around a single marker, in points.
const MARKER_HIT_RADIUS: f32 = 12.0;

/// Margin outside the map rect in which markers are still laid out.
const CULL_MARGIN: f32 = 60.0;

/// Upper bound for the drawn accuracy circle.
const MAX_ACCURACY_RADIUS: f32 = 2000.0;

/// Visual style of a household marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub fill: Color32,
    pub stroke: Stroke,
    pub radius: f32,
}

impl MarkerStyle {
    /// Single accent color used for every household.
    pub fn accent() -> Self {
        Self {
            fill: Color32::from_rgb(214, 69, 65),
            stroke: Stroke::new(2.0, Color32::WHITE),
            radius: 8.0,
        }
    }
}

/// A household pinned on the map.
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    /// Index into the dashboard's record slice.
    pub index: usize,
    pub position: Position,
    pub style: MarkerStyle,
}

impl Marker {
    pub fn new(index: usize, record: &HouseholdRecord, style: MarkerStyle) -> Self {
        Self {
            index,
            position: walkers::lat_lon(record.lat, record.lng),
            style,
        }
    }
}

/// What the user clicked on during the last frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerClick {
    Household(usize),
    Cluster(Position),
    Background,
}

/// Results the markers plugin hands back to the map view.
#[derive(Debug, Default)]
pub struct MarkerOutput {
    pub click: Option<MarkerClick>,
    /// Screen position of the marker whose popup is open, if it is on screen.
    pub popup_anchor: Option<Pos2>,
}

pub struct MarkersPlugin {
    pub markers: Vec<Marker>,
    pub layer: Arc<dyn MarkerLayer>,
    /// Record index whose popup is open.
    pub selected: Option<usize>,
    pub output: Arc<Mutex<MarkerOutput>>,
}

fn cluster_colors(size: ClusterSize) -> (Color32, Color32, f32) {
    match size {
        ClusterSize::Small => (Color32::from_rgba_unmultiplied(110, 204, 57, 110), Color32::from_rgb(110, 204, 57), 18.0),
        ClusterSize::Medium => (Color32::from_rgba_unmultiplied(240, 194, 12, 110), Color32::from_rgb(240, 194, 12), 22.0),
        ClusterSize::Large => (Color32::from_rgba_unmultiplied(241, 128, 23, 110), Color32::from_rgb(241, 128, 23), 26.0),
    }
}

impl Plugin for MarkersPlugin {
    fn run(self: Box<Self>, ui: &mut egui::Ui, response: &egui::Response, projector: &Projector, _memory: &MapMemory) {
        let map_rect = response.rect;
        let painter = ui.painter().with_clip_rect(map_rect);
        let cull_rect = map_rect.expand(CULL_MARGIN);

        let points: Vec<ScreenPoint> = self
            .markers
            .iter()
            .enumerate()
            .filter_map(|(slot, marker)| {
                let screen = projector.project(marker.position).to_pos2();
                cull_rect.contains(screen).then_some(ScreenPoint {
                    index: slot,
                    x: screen.x,
                    y: screen.y,
                })
            })
            .collect();

        let click_pos = if response.clicked() {
            response.interact_pointer_pos()
        } else {
            None
        };
        let mut click = click_pos.map(|_| MarkerClick::Background);
        let mut popup_anchor = None;

        for item in self.layer.layout(&points) {
            match item {
                LayerItem::Single(point) => {
                    let marker = &self.markers[point.index];
                    let center = Pos2::new(point.x, point.y);
                    painter.circle_filled(center, marker.style.radius, marker.style.fill);
                    painter.circle_stroke(center, marker.style.radius, marker.style.stroke);

                    if self.selected == Some(marker.index) {
                        popup_anchor = Some(center);
                    }
                    if click_pos.is_some_and(|p| p.distance(center) <= MARKER_HIT_RADIUS) {
                        click = Some(MarkerClick::Household(marker.index));
                    }
                }
                LayerItem::Cluster { x, y, ref members } => {
                    let center = Pos2::new(x, y);
                    let (halo, core, radius) = cluster_colors(ClusterSize::for_count(members.len()));
                    painter.circle_filled(center, radius, halo);
                    painter.circle_filled(center, radius - 5.0, core);
                    painter.text(
                        center,
                        egui::Align2::CENTER_CENTER,
                        members.len().to_string(),
                        egui::FontId::proportional(12.0),
                        Color32::BLACK,
                    );

                    if click_pos.is_some_and(|p| p.distance(center) <= radius) {
                        click = Some(MarkerClick::Cluster(projector.unproject(center.to_vec2())));
                    }
                }
            }
        }

        if let Ok(mut output) = self.output.lock() {
            output.click = click;
            output.popup_anchor = popup_anchor;
        }
    }
}

/// Accuracy circle and dot for the device position.
pub struct UserLocationPlugin {
    pub position: UserPosition,
}

impl Plugin for UserLocationPlugin {
    fn run(self: Box<Self>, ui: &mut egui::Ui, response: &egui::Response, projector: &Projector, memory: &MapMemory) {
        let painter = ui.painter().with_clip_rect(response.rect);
        let center = projector
            .project(walkers::lat_lon(self.position.lat, self.position.lng))
            .to_pos2();

        let meters_per_pixel = WebMercator::meters_per_pixel(self.position.lat, memory.zoom());
        if meters_per_pixel > 0.0 {
            #[allow(clippy::cast_possible_truncation, reason = "radius is clamped to screen scale")]
            let radius = ((self.position.accuracy / meters_per_pixel) as f32).min(MAX_ACCURACY_RADIUS);
            painter.circle_filled(center, radius, Color32::from_rgba_unmultiplied(66, 133, 244, 40));
            painter.circle_stroke(
                center,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(66, 133, 244, 120)),
            );
        }

        painter.circle_filled(center, 7.0, Color32::WHITE);
        painter.circle_filled(center, 5.0, Color32::from_rgb(66, 133, 244));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_carries_explicit_style() {
        let record = HouseholdRecord {
            id: "1".into(),
            promoter: "Ana".into(),
            head_name: "Betty".into(),
            phone: String::new(),
            dni: String::new(),
            lat: -12.05,
            lng: -77.04,
            photo: String::new(),
            notes: String::new(),
            address: String::new(),
            sector: String::new(),
        };
        let style = MarkerStyle::accent();
        let marker = Marker::new(3, &record, style);
        assert_eq!(marker.index, 3);
        assert_eq!(marker.style, style);
        assert!((marker.position.y() - -12.05).abs() < 1e-9);
        assert!((marker.position.x() - -77.04).abs() < 1e-9);
    }

    #[test]
    fn test_cluster_icons_grow_with_size() {
        let (_, _, small) = cluster_colors(ClusterSize::Small);
        let (_, _, medium) = cluster_colors(ClusterSize::Medium);
        let (_, _, large) = cluster_colors(ClusterSize::Large);
        assert!(small < medium && medium < large);
    }
}
