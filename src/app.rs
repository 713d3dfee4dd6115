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

//! Application root: owns the dataset, caches and configuration, and drives
//! the picker/dashboard stages.

use std::sync::Arc;

use log::{info, warn};
use padron_core::{select_layer, Dataset, Stage};
use walkers::HttpTiles;

use crate::config::AppConfig;
use crate::photo_cache::{PhotoCache, PhotoTextureManager};
use crate::tiles::{open_tiles, TileStyle};
use crate::ui::{DashboardAction, DashboardContext, DashboardView, MapSettings, PickerView};

pub struct PadronApp {
    config: AppConfig,
    dataset: Dataset,
    stage: Stage,
    picker: PickerView,
    dashboard: Option<DashboardView>,
    tiles: Option<HttpTiles>,
    photos: PhotoTextureManager,
    map_settings: MapSettings,
}

impl PadronApp {
    pub fn new(config: AppConfig, dataset: Dataset) -> Self {
        info!("Loaded {} household records", dataset.len());

        let photos = PhotoTextureManager::new(PhotoCache::new(
            config.photo_cache_max_entries,
            config.photo_cache_max_age(),
        ));
        let map_settings = MapSettings {
            provider: config.location_provider(),
            layer: Arc::from(select_layer(config.clustering_available())),
            watch_interval: config.location_watch_interval(),
            default_zoom: config.default_zoom,
        };

        Self {
            config,
            dataset,
            stage: Stage::default(),
            picker: PickerView::default(),
            dashboard: None,
            tiles: None,
            photos,
            map_settings,
        }
    }

    fn show_dashboard(&mut self, ui: &mut egui::Ui) {
        let Some(promoter) = self.stage.promoter() else {
            return;
        };
        let dashboard = self
            .dashboard
            .get_or_insert_with(|| DashboardView::new(&self.dataset, promoter));

        let style = self.config.tile_style;
        let max_age = self.config.tile_cache_max_age();
        let ctx = ui.ctx().clone();
        let tiles = self.tiles.get_or_insert_with(|| open_tiles(style, max_age, &ctx));

        let res = DashboardContext {
            dataset: &self.dataset,
            tiles,
            tile_style: style,
            photos: &self.photos,
            map_settings: &self.map_settings,
        };

        match dashboard.show(ui, res) {
            DashboardAction::None => {}
            DashboardAction::Back => {
                dashboard.leave(&ctx);
                self.dashboard = None;
                self.stage.back();
            }
            DashboardAction::SetTileStyle(style) => self.set_tile_style(style),
        }
    }

    /// Switch basemaps and persist the choice. Tiles reopen on the next frame.
    fn set_tile_style(&mut self, style: TileStyle) {
        info!("Switching basemap to {}", style.as_str());
        self.config.tile_style = style;
        self.tiles = None;
        if let Err(e) = self.config.save() {
            warn!("Failed to save configuration: {}", e);
        }
    }
}

impl eframe::App for PadronApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if matches!(self.stage, Stage::Picking) {
                if let Some(promoter) = self.picker.show(ui, self.dataset.records()) {
                    info!("Opening dashboard for {}", promoter);
                    self.dashboard = Some(DashboardView::new(&self.dataset, &promoter));
                    self.stage.select(&promoter);
                }
            } else {
                self.show_dashboard(ui);
            }
        });
    }
}
