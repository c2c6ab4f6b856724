use eframe::egui;

use dungeon_master::config::BackendProtocol;
use dungeon_master::model::message::Speaker;

use super::app::{DungeonApp, LeftTab};
use super::settings_io::save_settings;

pub fn draw_left_panel(ctx: &egui::Context, app: &mut DungeonApp) {
    egui::SidePanel::left("left")
        .resizable(true)
        .default_width(260.0)
        .min_width(200.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut app.ui.left_tab, LeftTab::Settings, "Settings");
                ui.selectable_value(&mut app.ui.left_tab, LeftTab::Models, "Models");
            });

            ui.separator();

            let tab = app.ui.left_tab;
            egui::ScrollArea::vertical().show(ui, |ui| match tab {
                LeftTab::Settings => draw_settings(ui, app),
                LeftTab::Models => draw_models(ui, app),
            });
        });
}

/* =========================
   Settings UI
   ========================= */

fn draw_settings(ui: &mut egui::Ui, app: &mut DungeonApp) {
    ui.heading("Display");

    ui.add(egui::Slider::new(&mut app.settings.ui_scale, 0.75..=2.0).text("UI scale"));

    ui.add_space(8.0);
    ui.label("Speaker colours");

    for speaker in [
        Speaker::Player,
        Speaker::Narrator,
        Speaker::Resolver,
        Speaker::System,
    ] {
        ui.horizontal(|ui| {
            let mut color = app.settings.color(speaker);
            if ui.color_edit_button_srgba(&mut color).changed() {
                app.settings.set_color(speaker, color);
            }
            ui.label(speaker.key());
        });
    }

    ui.add_space(8.0);

    if ui.button("💾 Save").clicked() {
        if let Err(e) = save_settings(&app.settings) {
            tracing::warn!(error = %e, "could not save ui settings");
        }
    }
}

/* =========================
   Models UI
   ========================= */

fn draw_models(ui: &mut egui::Ui, app: &mut DungeonApp) {
    let config = app.config.clone();

    ui.heading("Backend");

    let protocol = match config.gateway.protocol {
        BackendProtocol::Ollama => "Ollama",
        BackendProtocol::OpenAiCompatible => "OpenAI-compatible",
    };
    ui.label(format!("Protocol: {protocol}"));
    ui.label(format!("Endpoint: {}", config.gateway.endpoint));
    ui.label(format!("Timeout: {}s", config.gateway.timeout_secs));

    if ui.button("Test connection").clicked() {
        app.test_connection();
    }
    if let Some(status) = &app.ui.connection_status {
        ui.label(status.as_str());
    }

    ui.add_space(8.0);
    ui.separator();

    ui.collapsing("Narrators", |ui| {
        for (slot, name) in config.models.narrators.iter().enumerate() {
            ui.label(format!("#{slot} {name}"));
        }
    });

    ui.collapsing("Resolvers", |ui| {
        for (slot, name) in config.models.resolvers.iter().enumerate() {
            ui.label(format!("#{slot} {name}"));
        }
    });

    ui.label(format!(
        "Vision: {}",
        config.models.vision.as_deref().unwrap_or("(none)")
    ));
    ui.label(format!("Resolver routing: {:?}", config.resolver_routing));
    ui.label(format!("Vitality policy: {:?}", config.vitality_policy));
}
