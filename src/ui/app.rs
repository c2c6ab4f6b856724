use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use dungeon_master::config::EngineConfig;
use dungeon_master::engine::engine::Engine;
use dungeon_master::engine::frontend::ChannelFrontend;
use dungeon_master::engine::llm_client::HttpModelGateway;
use dungeon_master::engine::modality::PlayerInput;
use dungeon_master::engine::protocol::{EngineCommand, EngineResponse};
use dungeon_master::model::message::{Message, Speaker};
use dungeon_master::model::session_state::SessionSnapshot;
use dungeon_master::model::turn::{GameSummary, TerminationReason};

use crate::ui::center_panel::draw_center_panel;
use crate::ui::left_panel::draw_left_panel;
use crate::ui::right_panel::draw_right_panel;
use crate::ui::settings::UiSettings;
use crate::ui::settings_io::load_settings;

/* =========================
   Tabs
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeftTab {
    #[default]
    Settings,
    Models,
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub input_text: String,
    pub rendered_messages: Vec<Message>,
    pub snapshot: Option<SessionSnapshot>,
    pub awaiting_input: bool,
    pub game_over: Option<GameSummary>,
    pub should_auto_scroll: bool,
    pub left_tab: LeftTab,
    pub connection_status: Option<String>,
}

impl UiState {
    pub fn can_act(&self) -> bool {
        self.awaiting_input && self.game_over.is_none()
    }

    fn apply_response(&mut self, resp: EngineResponse) {
        match resp {
            EngineResponse::Scene { text, .. } if text.is_empty() => {
                self.rendered_messages
                    .push(Message::System("The narrator falls silent.".into()));
            }
            EngineResponse::Scene { text, .. } => {
                self.rendered_messages.push(Message::Narration {
                    speaker: Speaker::Narrator,
                    text,
                });
            }
            EngineResponse::Outcome { text, .. } => {
                self.rendered_messages.push(Message::Narration {
                    speaker: Speaker::Resolver,
                    text,
                });
            }
            EngineResponse::StateChanged(snapshot) => self.snapshot = Some(snapshot),
            EngineResponse::AwaitingInput => self.awaiting_input = true,
            EngineResponse::Notice(text) => self.rendered_messages.push(Message::System(text)),
            EngineResponse::GameOver(summary) => {
                let reason = match summary.reason {
                    TerminationReason::PlayerQuit => "You leave the dungeon.",
                    TerminationReason::VitalityDepleted => "Your strength gives out.",
                };
                self.rendered_messages.push(Message::System(format!(
                    "{reason} Game Over! Thanks for playing! ({} scenes)",
                    summary.scenes_completed
                )));
                self.snapshot = Some(summary.final_state.clone());
                self.game_over = Some(summary);
                self.awaiting_input = false;
            }
        }
        self.should_auto_scroll = true;
    }
}

/* =========================
   App
   ========================= */

pub struct DungeonApp {
    pub ui: UiState,
    pub settings: UiSettings,
    pub config: Arc<EngineConfig>,

    gateway: HttpModelGateway,
    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
    probe_rx: Option<mpsc::Receiver<String>>,
}

impl DungeonApp {
    pub fn new(config: Arc<EngineConfig>, gateway: HttpModelGateway, mut engine: Engine) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let mut frontend = ChannelFrontend::new(cmd_rx, resp_tx);
            engine.run(&mut frontend);
        });

        Self {
            ui: UiState::default(),
            settings: load_settings(),
            config,
            gateway,
            cmd_tx,
            resp_rx,
            probe_rx: None,
        }
    }

    pub fn submit(&mut self, input: PlayerInput) {
        let shown = match &input {
            PlayerInput::Text(t) => t.clone(),
            PlayerInput::Voice(path) => format!("🎤 {path}"),
            PlayerInput::Image(path) => format!("🖼 {path}"),
            PlayerInput::Quit => "quit".to_string(),
        };
        self.ui.rendered_messages.push(Message::Player(shown));
        self.ui.awaiting_input = false;
        self.ui.should_auto_scroll = true;

        if self.cmd_tx.send(EngineCommand::Submit(input)).is_err() {
            tracing::warn!("engine thread is gone");
        }
    }

    /// Runs the backend probe off the UI thread.
    pub fn test_connection(&mut self) {
        let (tx, rx) = mpsc::channel();
        let gateway = self.gateway.clone();

        std::thread::spawn(move || {
            let status = gateway
                .probe()
                .unwrap_or_else(|e| format!("Connection failed: {e}"));
            let _ = tx.send(status);
        });

        self.ui.connection_status = Some("Testing…".into());
        self.probe_rx = Some(rx);
    }

    fn poll(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            self.ui.apply_response(resp);
        }

        if let Some(rx) = &self.probe_rx {
            if let Ok(status) = rx.try_recv() {
                self.ui.connection_status = Some(status);
                self.probe_rx = None;
            }
        }
    }

    pub fn draw_message(&self, ui: &mut egui::Ui, msg: &Message) {
        let color = self.settings.color(msg.speaker());
        let right = matches!(msg, Message::Player(_));
        let text = match msg {
            Message::Player(t) => format!("You: {t}"),
            other => other.text().to_string(),
        };

        ui.add_space(6.0);

        if right {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, color, &text);
            });
        } else {
            bubble(ui, color, &text);
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for DungeonApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);

        self.poll();

        draw_left_panel(ctx, self);
        draw_right_panel(ctx, &self.ui);
        draw_center_panel(ctx, self);

        self.ui.should_auto_scroll = false;

        // The engine thread answers asynchronously.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/* =========================
   UI Helpers
   ========================= */

fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    ui.group(|ui| {
        ui.colored_label(color, text);
    });
}
