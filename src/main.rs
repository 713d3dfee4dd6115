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

mod app;
mod cache;
mod config;
mod photo_cache;
mod tiles;
mod ui;

use eframe::egui;
use log::{info, warn};
use padron_core::Dataset;

use app::PadronApp;
use config::AppConfig;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting Padrón Desktop...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }
    };
    if let Ok(path) = AppConfig::get_config_path() {
        info!("Configuration file: {}", path.display());
    }

    let dataset = match Dataset::bundled() {
        Ok(dataset) => dataset,
        Err(e) => {
            warn!("Bundled household data is unreadable: {}", e);
            Dataset::from_records(Vec::new())
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title("Padrón de hogares"),
        ..Default::default()
    };

    eframe::run_native(
        "Padrón Desktop",
        options,
        Box::new(move |_cc| Ok(Box::new(PadronApp::new(config, dataset)))),
    )
}
