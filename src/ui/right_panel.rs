use eframe::egui;

use super::app::UiState;

pub fn draw_right_panel(ctx: &egui::Context, ui_state: &UiState) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(280.0)
        .min_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Adventurer");
            ui.separator();

            let Some(snapshot) = &ui_state.snapshot else {
                ui.label("Waiting for the game to start…");
                return;
            };

            egui::ScrollArea::vertical().show(ui, |ui| {
                let max = snapshot.max_health.max(1) as f32;
                let fraction = (snapshot.health as f32 / max).clamp(0.0, 1.0);
                ui.label("Health");
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .text(format!("{}/{}", snapshot.health, snapshot.max_health)),
                );

                ui.add_space(8.0);
                ui.label(format!("Location: {}", snapshot.location));
                ui.label(format!("Scene: {}", snapshot.scene_index));

                ui.add_space(8.0);
                ui.collapsing("Inventory", |ui| {
                    if snapshot.inventory.is_empty() {
                        ui.weak("(empty)");
                    }
                    for item in &snapshot.inventory {
                        ui.label(format!("• {item}"));
                    }
                });

                if !snapshot.last_outcome.is_empty() {
                    ui.collapsing("Last outcome", |ui| {
                        ui.label(snapshot.last_outcome.as_str());
                    });
                }

                if let Some(summary) = &ui_state.game_over {
                    ui.add_space(12.0);
                    ui.group(|ui| {
                        ui.colored_label(egui::Color32::LIGHT_RED, "Game Over");
                        ui.label(format!("Reason: {:?}", summary.reason));
                        ui.label(format!("Scenes completed: {}", summary.scenes_completed));
                    });
                }
            });
        });
}
