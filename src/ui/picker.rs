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

//! Promoter picker shown before a dashboard is opened.

use egui::{Color32, RichText};
use padron_core::{list_promoters, HouseholdRecord};

#[derive(Debug, Default)]
pub struct PickerView {
    query: String,
}

impl PickerView {
    /// Draw the picker. Returns the promoter name the user selected.
    pub fn show(&mut self, ui: &mut egui::Ui, records: &[HouseholdRecord]) -> Option<String> {
        let mut selected = None;

        ui.vertical_centered(|ui| {
            ui.set_max_width(480.0);
            ui.add_space(16.0);
            ui.heading("Padrón de hogares");
            ui.label(RichText::new("Elige un promotor para ver sus hogares").color(Color32::GRAY));
            ui.add_space(12.0);

            ui.add(
                egui::TextEdit::singleline(&mut self.query)
                    .hint_text("Buscar promotor")
                    .desired_width(f32::INFINITY),
            );
            ui.add_space(8.0);

            let promoters = list_promoters(records, &self.query);
            if promoters.is_empty() {
                ui.label(RichText::new("Sin resultados").color(Color32::GRAY));
                return;
            }

            egui::ScrollArea::vertical().auto_shrink([false, true]).show(ui, |ui| {
                for promoter in promoters {
                    let label = format!("{} ({})", promoter.name, promoter.count);
                    let button = egui::Button::new(RichText::new(label).size(15.0))
                        .min_size(egui::vec2(ui.available_width(), 36.0));
                    if ui.add(button).clicked() {
                        selected = Some(promoter.name);
                    }
                }
            });
        });

        selected
    }
}
