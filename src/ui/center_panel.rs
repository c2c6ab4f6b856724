use eframe::egui;

use dungeon_master::engine::modality::PlayerInput;

use super::app::DungeonApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut DungeonApp) {
    let input_id = egui::Id::new("chat_input_box");
    let enabled = app.ui.can_act();

    // ---------- Input bar ----------
    egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
        let mut send_now = false;
        let mut attached: Option<PlayerInput> = None;

        ui.horizontal(|ui| {
            let response = ui.add_enabled(
                enabled,
                egui::TextEdit::multiline(&mut app.ui.input_text)
                    .id(input_id)
                    .desired_width(ui.available_width() - 180.0)
                    .desired_rows(2)
                    .hint_text("Pick 1-3 or describe what you do…")
                    .lock_focus(true),
            );

            // Enter vs Shift+Enter
            if response.has_focus() {
                let (enter, shift) =
                    ui.input(|i| (i.key_pressed(egui::Key::Enter), i.modifiers.shift));
                if enter && !shift {
                    send_now = true;
                }
            }

            ui.vertical(|ui| {
                if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
                    send_now = true;
                }

                ui.horizontal(|ui| {
                    if ui.add_enabled(enabled, egui::Button::new("🎤 Voice")).clicked() {
                        attached = pick_file("Audio", &["wav", "mp3", "ogg", "flac", "m4a"])
                            .map(PlayerInput::Voice);
                    }
                    if ui.add_enabled(enabled, egui::Button::new("🖼 Image")).clicked() {
                        attached = pick_file("Images", &["png", "jpg", "jpeg"])
                            .map(PlayerInput::Image);
                    }
                });

                if ui.add_enabled(enabled, egui::Button::new("Quit")).clicked() {
                    attached = Some(PlayerInput::Quit);
                }
            });
        });

        if let Some(input) = attached {
            app.submit(input);
        } else if send_now {
            let text = app.ui.input_text.trim().to_string();

            if !text.is_empty() {
                app.submit(PlayerInput::parse(&text));
                app.ui.input_text.clear();
            }

            // Keep cursor focused
            ui.memory_mut(|m| m.request_focus(input_id));
        }
    });

    // ---------- Chat history ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical()
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                for msg in &app.ui.rendered_messages {
                    app.draw_message(ui, msg);
                }

                if !app.ui.awaiting_input && app.ui.game_over.is_none() {
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("The dungeon master is thinking…");
                    });
                }
            });
    });
}

fn pick_file(kind: &str, extensions: &[&str]) -> Option<String> {
    rfd::FileDialog::new()
        .add_filter(kind, extensions)
        .pick_file()
        .map(|path| path.display().to_string())
}
