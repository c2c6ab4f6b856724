use std::io::{BufRead, Write};
use std::sync::mpsc::{Receiver, Sender};

use crate::engine::modality::PlayerInput;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::turn::{GameSummary, TerminationReason};

/// Presentation boundary: shows engine output and supplies player input.
pub trait Frontend {
    fn present(&mut self, response: EngineResponse);

    /// Blocks until the player acts.
    fn next_input(&mut self) -> PlayerInput;
}

/// Bridges the engine thread to the UI thread.
pub struct ChannelFrontend {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
}

impl ChannelFrontend {
    pub fn new(rx: Receiver<EngineCommand>, tx: Sender<EngineResponse>) -> Self {
        Self { rx, tx }
    }
}

impl Frontend for ChannelFrontend {
    fn present(&mut self, response: EngineResponse) {
        if self.tx.send(response).is_err() {
            tracing::debug!("ui receiver dropped");
        }
    }

    fn next_input(&mut self) -> PlayerInput {
        match self.rx.recv() {
            Ok(EngineCommand::Submit(input)) => input,
            // Window closed.
            Err(_) => PlayerInput::Quit,
        }
    }
}

/// Plain terminal loop.
pub struct ConsoleFrontend<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleFrontend<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn greet(&mut self) {
        self.write("Welcome to AI Dungeon!\n");
    }

    fn write(&mut self, text: &str) {
        let result = self
            .output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "console write failed");
        }
    }

    fn render_summary(summary: &GameSummary) -> String {
        let reason = match summary.reason {
            TerminationReason::PlayerQuit => "You leave the dungeon.",
            TerminationReason::VitalityDepleted => "Your strength gives out.",
        };
        format!(
            "\n{reason}\nScenes completed: {}\nGame Over! Thanks for playing!\n",
            summary.scenes_completed
        )
    }
}

impl<R: BufRead, W: Write> Frontend for ConsoleFrontend<R, W> {
    fn present(&mut self, response: EngineResponse) {
        let text = match response {
            EngineResponse::Scene { text, .. } => format!("\n{text}\n\n"),
            EngineResponse::Outcome { text, .. } => format!("{text}\n"),
            EngineResponse::StateChanged(s) => format!(
                "[health {}/{} | {} | {}]\n",
                s.health,
                s.max_health,
                s.location,
                if s.inventory.is_empty() {
                    "empty-handed".to_string()
                } else {
                    s.inventory.join(", ")
                }
            ),
            EngineResponse::AwaitingInput => "Your choice (1-3, or 'quit'): ".to_string(),
            EngineResponse::Notice(text) => format!("({text})\n"),
            EngineResponse::GameOver(summary) => Self::render_summary(&summary),
        };
        self.write(&text);
    }

    fn next_input(&mut self) -> PlayerInput {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => PlayerInput::Quit,
            Ok(_) => PlayerInput::parse(&line),
            Err(e) => {
                tracing::warn!(error = %e, "console read failed");
                PlayerInput::Quit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::session_state::SessionState;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn console_reads_lines_and_quits_on_eof() {
        let input = Cursor::new("1\n/image map.png\n");
        let mut console = ConsoleFrontend::new(input, Vec::new());

        assert_eq!(console.next_input(), PlayerInput::Text("1".into()));
        assert_eq!(console.next_input(), PlayerInput::Image("map.png".into()));
        assert_eq!(console.next_input(), PlayerInput::Quit);
    }

    #[test]
    fn console_renders_scene_and_summary() {
        let mut console = ConsoleFrontend::new(Cursor::new(""), Vec::new());
        console.greet();
        console.present(EngineResponse::Scene {
            scene_index: 0,
            model: crate::model::model_identity::ModelIdentity::narrator(0),
            text: "A dark hall.".into(),
        });
        console.present(EngineResponse::GameOver(GameSummary {
            reason: TerminationReason::VitalityDepleted,
            scenes_completed: 4,
            final_state: SessionState::default().snapshot(),
        }));

        let out = String::from_utf8(console.output).unwrap();
        assert!(out.starts_with("Welcome to AI Dungeon!"));
        assert!(out.contains("A dark hall."));
        assert!(out.contains("Scenes completed: 4"));
        assert!(out.trim_end().ends_with("Game Over! Thanks for playing!"));
    }

    #[test]
    fn channel_disconnect_means_quit() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let mut frontend = ChannelFrontend::new(cmd_rx, resp_tx);

        cmd_tx
            .send(EngineCommand::Submit(PlayerInput::Text("look".into())))
            .unwrap();
        assert_eq!(frontend.next_input(), PlayerInput::Text("look".into()));

        frontend.present(EngineResponse::AwaitingInput);
        assert_eq!(resp_rx.recv().unwrap(), EngineResponse::AwaitingInput);

        drop(cmd_tx);
        assert_eq!(frontend.next_input(), PlayerInput::Quit);
    }
}
