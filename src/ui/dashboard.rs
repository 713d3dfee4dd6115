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

//! Dashboard for one promoter: header, tab selector and the active tab.

use egui::{Color32, RichText};
use log::debug;
use padron_core::{Dashboard, Dataset, Tab};
use walkers::HttpTiles;

use super::list_view::ListView;
use super::map_view::{MapSettings, MapView};
use crate::photo_cache::PhotoTextureManager;
use crate::tiles::TileStyle;

/// Shared app resources the dashboard renders with.
pub struct DashboardContext<'a> {
    pub dataset: &'a Dataset,
    pub tiles: &'a mut HttpTiles,
    pub tile_style: TileStyle,
    pub photos: &'a PhotoTextureManager,
    pub map_settings: &'a MapSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    None,
    Back,
    SetTileStyle(TileStyle),
}

pub struct DashboardView {
    dashboard: Dashboard,
    list: ListView,
    /// Only alive while the map tab is active; dropping it stops location tracking.
    map: Option<MapView>,
}

impl DashboardView {
    pub fn new(dataset: &Dataset, promoter: &str) -> Self {
        Self {
            dashboard: Dashboard::new(dataset, promoter),
            list: ListView::default(),
            map: None,
        }
    }

    fn switch_tab(&mut self, ctx: &egui::Context, tab: Tab, settings: &MapSettings) {
        if self.dashboard.tab() == tab {
            return;
        }
        debug!("Switching to {} tab", tab.label());
        self.dashboard.set_tab(tab);
        self.map = match tab {
            Tab::Map => Some(MapView::new(ctx, settings.clone())),
            Tab::List => None,
        };
    }

    /// Restore the host window before the dashboard goes away.
    pub fn leave(&mut self, ctx: &egui::Context) {
        if let Some(map) = &mut self.map {
            map.exit_fullscreen(ctx);
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, res: DashboardContext<'_>) -> DashboardAction {
        let promoter = self.dashboard.promoter().to_string();
        self.dashboard.refresh(res.dataset, &promoter);

        let mut action = DashboardAction::None;
        let header_hidden = self.map.as_ref().is_some_and(MapView::is_fullscreen);

        if !header_hidden {
            ui.horizontal(|ui| {
                if ui.button("← Volver").clicked() {
                    action = DashboardAction::Back;
                }
                ui.heading(&promoter);
                ui.label(
                    RichText::new(format!("{} hogares", self.dashboard.records().len())).color(Color32::GRAY),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let current = self.dashboard.tab();
                    let mut chosen = current;
                    for tab in [Tab::Map, Tab::List] {
                        ui.selectable_value(&mut chosen, tab, tab.label());
                    }
                    if chosen != current {
                        self.switch_tab(ui.ctx(), chosen, res.map_settings);
                    }

                    if current == Tab::Map {
                        let mut style = res.tile_style;
                        egui::ComboBox::from_id_salt("tile_style")
                            .selected_text(style.label())
                            .show_ui(ui, |ui| {
                                for option in TileStyle::ALL {
                                    ui.selectable_value(&mut style, option, option.label());
                                }
                            });
                        if style != res.tile_style {
                            action = DashboardAction::SetTileStyle(style);
                        }
                    }
                });
            });
            ui.separator();
        }

        match self.dashboard.tab() {
            Tab::List => self.list.show(ui, self.dashboard.records(), res.photos),
            Tab::Map => {
                let map = self
                    .map
                    .get_or_insert_with(|| MapView::new(ui.ctx(), res.map_settings.clone()));
                map.show(ui, self.dashboard.records(), res.tiles, res.tile_style.attribution_text());
            }
        }

        action
    }
}
