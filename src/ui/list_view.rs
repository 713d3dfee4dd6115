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

//! List tab: household cards, search and the detail overlay.

use egui::{Color32, RichText};
use log::warn;
use padron_core::list::{should_dismiss, Bounds};
use padron_core::{HouseholdRecord, ListState};

use crate::photo_cache::PhotoTextureManager;

const CARD_ACCENT: Color32 = Color32::from_rgb(214, 69, 65);

#[derive(Default)]
pub struct ListView {
    state: ListState,
    /// Set on the frame the overlay opens so the opening click is not read as a dismissal.
    just_opened: bool,
}

fn bounds_of(rect: egui::Rect) -> Bounds {
    Bounds {
        min_x: rect.min.x,
        min_y: rect.min.y,
        max_x: rect.max.x,
        max_y: rect.max.y,
    }
}

fn detail_row(ui: &mut egui::Ui, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    ui.label(RichText::new(label).color(Color32::GRAY));
    ui.label(value);
    ui.end_row();
}

impl ListView {
    pub fn show(&mut self, ui: &mut egui::Ui, records: &[HouseholdRecord], photos: &PhotoTextureManager) {
        ui.add(
            egui::TextEdit::singleline(&mut self.state.query)
                .hint_text("Buscar por nombre, dirección, DNI o teléfono")
                .desired_width(f32::INFINITY),
        );
        ui.add_space(6.0);

        let visible = self.state.visible(records);
        if visible.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.label(RichText::new("No se encontraron hogares").color(Color32::GRAY));
            });
        }

        let mut opened = None;
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for record in &visible {
                let frame = egui::Frame::group(ui.style()).inner_margin(egui::Margin::same(10));
                let card = frame.show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(record.display_name()).strong().size(15.0).color(CARD_ACCENT));
                    if !record.address.is_empty() {
                        ui.label(&record.address);
                    }
                    ui.horizontal(|ui| {
                        if !record.sector.is_empty() {
                            ui.label(RichText::new(&record.sector).small().color(Color32::GRAY));
                        }
                        if !record.phone.is_empty() {
                            ui.label(RichText::new(format!("📞 {}", record.phone)).small());
                        }
                    });
                });

                let response = ui.interact(card.response.rect, ui.id().with(("card", &record.id)), egui::Sense::click());
                if response.on_hover_cursor(egui::CursorIcon::PointingHand).clicked() {
                    opened = records.iter().position(|r| std::ptr::eq(r, *record));
                }
                ui.add_space(4.0);
            }
        });

        if let Some(index) = opened {
            self.state.open(index);
            self.just_opened = true;
        }

        if let Some(record) = self.state.selected(records) {
            let close = self.show_detail(ui.ctx(), record, photos);
            if close {
                self.state.close();
            }
        }
        self.just_opened = false;
    }

    /// Draw the overlay. Returns true when it should close.
    fn show_detail(&self, ctx: &egui::Context, record: &HouseholdRecord, photos: &PhotoTextureManager) -> bool {
        let screen = ctx.screen_rect();
        let mut close = false;

        // Scrim blocks interaction with the cards underneath
        egui::Area::new(egui::Id::new("household_detail_scrim"))
            .order(egui::Order::Middle)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                ui.allocate_response(screen.size(), egui::Sense::click());
                ui.painter().rect_filled(screen, 0.0, Color32::from_black_alpha(150));
            });

        let content = egui::Area::new(egui::Id::new("household_detail"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                egui::Frame::window(ui.style()).show(ui, |ui| {
                    ui.set_max_width(420.0);
                    ui.horizontal(|ui| {
                        ui.heading(record.display_name());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            close |= ui.button("✕").clicked();
                        });
                    });
                    ui.separator();

                    if !record.photo.is_empty() {
                        match photos.get_or_load_texture(ctx, &record.photo) {
                            Some(texture) => {
                                ui.add(egui::Image::new(&texture).max_width(400.0).corner_radius(6.0));
                            }
                            None if photos.has_failed(&record.photo) => {
                                ui.label(RichText::new("Foto no disponible").color(Color32::GRAY));
                            }
                            None => {
                                ui.spinner();
                            }
                        }
                        ui.add_space(6.0);
                    }

                    egui::Grid::new("household_detail_fields")
                        .num_columns(2)
                        .spacing([12.0, 6.0])
                        .show(ui, |ui| {
                            detail_row(ui, "DNI", &record.dni);
                            if let Some(link) = record.phone_link() {
                                ui.label(RichText::new("Teléfono").color(Color32::GRAY));
                                ui.hyperlink_to(&record.phone, link);
                                ui.end_row();
                            }
                            detail_row(ui, "Dirección", &record.address);
                            detail_row(ui, "Sector", &record.sector);
                            detail_row(ui, "Promotor", &record.promoter);
                            detail_row(ui, "Notas", &record.notes);
                            ui.label(RichText::new("Coordenadas").color(Color32::GRAY));
                            ui.label(format!("{:.6}, {:.6}", record.lat, record.lng));
                            ui.end_row();
                        });

                    ui.add_space(8.0);
                    if ui.button("🗺 Abrir en mapas").clicked() {
                        let url = record.map_search_url();
                        if let Err(e) = webbrowser::open(&url) {
                            warn!("Failed to open {}: {}", url, e);
                        }
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            close = true;
        }

        if !self.just_opened {
            let click = ctx.input(|i| {
                if i.pointer.primary_clicked() {
                    i.pointer.interact_pos()
                } else {
                    None
                }
            });
            if let Some(pos) = click {
                close |= should_dismiss(bounds_of(content.response.rect), (pos.x, pos.y));
            }
        }

        close
    }
}
