//! Overlays egui : écran de chargement et fiche d'inspection.

use egui::{Align2, Color32, Context, Frame, ProgressBar, Rect, RichText, Shape, pos2, vec2};
use engine::{HudState, MapCamera};

use crate::loading::LoadingScreen;
use crate::map_view::{MapTextures, to_pos};

pub fn draw_loading(ctx: &Context, screen: &LoadingScreen) {
    egui::Area::new(egui::Id::new("loading"))
        .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
        .show(ctx, |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_width(360.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Granary farm");
                    ui.add_space(8.0);
                    if screen.has_failed() {
                        ui.label(RichText::new(screen.text()).color(Color32::LIGHT_RED));
                    } else {
                        ui.add(
                            ProgressBar::new(screen.percent() / 100.0)
                                .text(format!("{:.0}%", screen.percent())),
                        );
                        ui.label(screen.text());
                    }
                });
            });
        });
}

pub fn draw_hud(ctx: &Context, camera: &MapCamera, hud: &HudState, textures: &MapTextures) {
    let anchor = to_pos(camera, hud.anchor);
    let info = &hud.info;

    egui::Area::new(egui::Id::new("granary hud"))
        .fixed_pos(anchor)
        .pivot(Align2::CENTER_BOTTOM)
        .show(ctx, |ui| {
            let background = ui.painter().add(Shape::Noop);
            let mut frame = Frame::popup(ui.style());
            if textures.info_bg.is_some() {
                frame = frame.fill(Color32::TRANSPARENT);
            }

            let shown = frame.show(ui, |ui| {
                ui.set_min_width(220.0);
                ui.heading(&info.granary_name);
                ui.separator();

                egui::Grid::new("hud fields").num_columns(2).show(ui, |ui| {
                    ui.label("Temperature");
                    ui.horizontal(|ui| {
                        if let Some(icon) = &textures.temperature {
                            ui.image((icon.id(), vec2(16.0, 16.0)));
                        }
                        ui.label(&info.temperature);
                    });
                    ui.end_row();

                    ui.label("Grain");
                    ui.horizontal(|ui| {
                        if let Some(image) = textures.beans.get(&info.grain_img) {
                            ui.image((image.id(), vec2(24.0, 24.0)));
                        }
                        ui.label(&info.grain);
                    });
                    ui.end_row();

                    ui.label("Weight");
                    ui.label(RichText::new(format!("{} t", hud.weight.value())).strong());
                    ui.end_row();

                    ui.label("Granary height");
                    ui.label(&info.granary_height);
                    ui.end_row();

                    ui.label("Grain height");
                    ui.label(&info.grain_height);
                    ui.end_row();
                });
            });

            if let Some(image) = &textures.info_bg {
                let full = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                ui.painter().set(
                    background,
                    Shape::image(image.id(), shown.response.rect, full, Color32::WHITE),
                );
            }
        });
}
