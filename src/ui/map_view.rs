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

//! Map tab: household markers, device location, "center on me" and fullscreen.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use egui::{Align2, Color32, RichText};
use log::{debug, info};
use padron_core::geolocation::Notify;
use padron_core::map::{popup_fields, PopupField, FLY_DURATION, RECENTER_ZOOM};
use padron_core::record::center_of;
use padron_core::{
    FlyTo, GeolocationTracker, HouseholdRecord, LocationProvider, MapViewState, MarkerLayer, PositionOptions, Recenter,
};
use walkers::{HttpTiles, Map, MapMemory, Position};

use super::markers::{Marker, MarkerClick, MarkerOutput, MarkerStyle, MarkersPlugin, UserLocationPlugin};

/// Zoom levels added when a cluster is clicked.
const CLUSTER_ZOOM_STEP: f64 = 2.0;

/// Settings the map view needs from the app.
#[derive(Clone)]
pub struct MapSettings {
    pub provider: Arc<dyn LocationProvider>,
    pub layer: Arc<dyn MarkerLayer>,
    pub watch_interval: Duration,
    pub default_zoom: f64,
}

/// Camera animation in progress, with its start time in `egui` input seconds.
struct Flight {
    path: FlyTo,
    started: f64,
}

pub struct MapView {
    state: MapViewState,
    tracker: GeolocationTracker,
    settings: MapSettings,
    notify: Notify,
    memory: MapMemory,
    home: Position,
    flight: Option<Flight>,
    /// Record index whose popup is open.
    selected: Option<usize>,
    output: Arc<Mutex<MarkerOutput>>,
}

impl MapView {
    /// Build the view and subscribe to location updates until it is dropped.
    pub fn new(ctx: &egui::Context, settings: MapSettings) -> Self {
        let repaint_ctx = ctx.clone();
        let notify: Notify = Arc::new(move || repaint_ctx.request_repaint());
        let tracker = GeolocationTracker::watch(
            Arc::clone(&settings.provider),
            PositionOptions::default(),
            settings.watch_interval,
            Arc::clone(&notify),
        );
        info!("Map view opened with {} markers", settings.layer.name());

        Self {
            state: MapViewState::default(),
            tracker,
            settings,
            notify,
            memory: MapMemory::default(),
            home: walkers::lat_lon(padron_core::DEFAULT_CENTER.0, padron_core::DEFAULT_CENTER.1),
            flight: None,
            selected: None,
            output: Arc::new(Mutex::new(MarkerOutput::default())),
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.is_fullscreen()
    }

    /// Leave fullscreen, also on the host window.
    pub fn exit_fullscreen(&mut self, ctx: &egui::Context) {
        if self.state.exit_fullscreen() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
        }
    }

    fn toggle_fullscreen(&mut self, ctx: &egui::Context) {
        let fullscreen = self.state.toggle_fullscreen();
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(fullscreen));
    }

    fn remount(&mut self, records: &[&HouseholdRecord]) {
        let (lat, lng) = center_of(records.iter().copied());
        self.home = walkers::lat_lon(lat, lng);
        self.memory = MapMemory::default();
        if let Err(e) = self.memory.set_zoom(self.settings.default_zoom) {
            debug!("Default zoom rejected: {:?}", e);
        }
        self.flight = None;
        self.selected = None;
    }

    fn fly_to(&mut self, ctx: &egui::Context, lat: f64, lng: f64) {
        let from = self.memory.detached().unwrap_or(self.home);
        self.flight = Some(Flight {
            path: FlyTo {
                from: (from.y(), from.x()),
                from_zoom: self.memory.zoom(),
                to: (lat, lng),
                to_zoom: RECENTER_ZOOM,
                duration: FLY_DURATION,
            },
            started: ctx.input(|i| i.time),
        });
        ctx.request_repaint();
    }

    fn advance_flight(&mut self, ctx: &egui::Context) {
        let Some(flight) = &self.flight else {
            return;
        };
        let elapsed = (ctx.input(|i| i.time) - flight.started).max(0.0);
        let sample = flight.path.sample(Duration::from_secs_f64(elapsed));

        self.memory.center_at(walkers::lat_lon(sample.center.0, sample.center.1));
        if let Err(e) = self.memory.set_zoom(sample.zoom) {
            debug!("Fly-to zoom rejected: {:?}", e);
        }
        if sample.finished {
            self.flight = None;
        } else {
            ctx.request_repaint();
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        ui.horizontal(|ui| {
            if self.state.is_fullscreen() {
                ui.add(
                    egui::TextEdit::singleline(&mut self.state.fullscreen_query)
                        .hint_text("Filtrar por jefe de hogar")
                        .desired_width(240.0),
                );
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let fullscreen_label = if self.state.is_fullscreen() {
                    "🗗 Salir de pantalla completa"
                } else {
                    "⛶ Pantalla completa"
                };
                if ui.button(fullscreen_label).clicked() {
                    self.toggle_fullscreen(&ctx);
                }

                let available = self.tracker.is_available();
                let center_button = ui
                    .add_enabled(available, egui::Button::new("📍 Centrar en mí"))
                    .on_disabled_hover_text("Ubicación no disponible en este equipo");
                if center_button.clicked() {
                    let outcome = self.state.center_on_me(
                        self.tracker.position(),
                        &self.settings.provider,
                        PositionOptions::default(),
                        Arc::clone(&self.notify),
                    );
                    match outcome {
                        Recenter::FlyTo { lat, lng } => self.fly_to(&ctx, lat, lng),
                        Recenter::Requested => debug!("Waiting for a location fix"),
                        Recenter::Unavailable => debug!("Center on me ignored; no location capability"),
                    }
                }
                if self.state.is_requesting() {
                    ui.spinner();
                }
            });
        });
    }

    fn draw_popup(&mut self, ctx: &egui::Context, records: &[HouseholdRecord], anchor: egui::Pos2) {
        let Some(record) = self.selected.and_then(|i| records.get(i)) else {
            return;
        };
        let mut close = false;

        egui::Area::new(egui::Id::new("household_popup"))
            .order(egui::Order::Foreground)
            .fixed_pos(anchor - egui::vec2(0.0, 14.0))
            .pivot(Align2::CENTER_BOTTOM)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(260.0);
                    for field in popup_fields(record) {
                        match field {
                            PopupField::HeadName(name) => {
                                ui.horizontal(|ui| {
                                    ui.label(RichText::new(name).strong());
                                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                        close = ui.small_button("✕").clicked();
                                    });
                                });
                            }
                            PopupField::Address(address) => {
                                ui.label(address);
                            }
                            PopupField::Phone { number, link } => {
                                ui.hyperlink_to(format!("📞 {}", number), link);
                            }
                            PopupField::Dni(dni) => {
                                ui.label(format!("DNI: {}", dni));
                            }
                            PopupField::Notes(notes) => {
                                ui.label(RichText::new(notes).italics().color(Color32::GRAY));
                            }
                        }
                    }
                });
            });

        if close {
            self.selected = None;
        }
    }

    fn draw_alert(&mut self, ctx: &egui::Context) {
        let Some(text) = self.state.alert().map(str::to_string) else {
            return;
        };
        egui::Window::new("Ubicación")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(text);
                ui.add_space(8.0);
                if ui.button("Aceptar").clicked() {
                    self.state.dismiss_alert();
                }
            });
    }

    pub fn show(&mut self, ui: &mut egui::Ui, records: &[HouseholdRecord], tiles: &mut HttpTiles, attribution: &str) {
        let ctx = ui.ctx().clone();

        if self.state.is_fullscreen() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.exit_fullscreen(&ctx);
        }

        if let Some(position) = self.state.poll_request() {
            self.tracker.record_update(Ok(position));
            self.fly_to(&ctx, position.lat, position.lng);
        }

        self.draw_toolbar(ui);

        let visible = self.state.visible_points(records);
        if self.state.needs_remount(visible.len()) {
            self.remount(&visible);
        }
        let indices = self.state.visible_indices(records);
        self.advance_flight(&ctx);

        let style = MarkerStyle::accent();
        let markers: Vec<Marker> = indices
            .iter()
            .map(|&i| Marker::new(i, &records[i], style))
            .collect();

        let markers_plugin = MarkersPlugin {
            markers,
            layer: Arc::clone(&self.settings.layer),
            selected: self.selected,
            output: Arc::clone(&self.output),
        };

        let map_rect = ui.available_rect_before_wrap();
        let home = self.home;
        let generation = self.state.generation();
        let user_position = self.tracker.position();

        ui.push_id(("household_map", generation), |ui| {
            let mut map = Map::new(Some(tiles), &mut self.memory, home).with_plugin(markers_plugin);
            if let Some(position) = user_position {
                map = map.with_plugin(UserLocationPlugin { position });
            }
            ui.add(map);
        });

        // The map has taken its zoom input; nothing else on the page may scroll
        if self.state.scroll_locked() {
            ctx.input_mut(|i| {
                i.smooth_scroll_delta = egui::Vec2::ZERO;
                i.raw_scroll_delta = egui::Vec2::ZERO;
            });
        }

        let (click, anchor) = match self.output.lock() {
            Ok(mut output) => (output.click.take(), output.popup_anchor),
            Err(_) => (None, None),
        };
        match click {
            Some(MarkerClick::Household(index)) => self.selected = Some(index),
            Some(MarkerClick::Cluster(position)) => {
                self.flight = None;
                self.memory.center_at(position);
                if let Err(e) = self.memory.set_zoom(self.memory.zoom() + CLUSTER_ZOOM_STEP) {
                    debug!("Cluster zoom rejected: {:?}", e);
                }
            }
            Some(MarkerClick::Background) => self.selected = None,
            None => {}
        }

        if let Some(anchor) = anchor {
            self.draw_popup(&ctx, records, anchor);
        }

        ui.painter().text(
            map_rect.max - egui::vec2(5.0, 5.0),
            Align2::RIGHT_BOTTOM,
            attribution,
            egui::FontId::proportional(10.0),
            Color32::from_black_alpha(170),
        );

        self.draw_alert(&ctx);
    }
}
