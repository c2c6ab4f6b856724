use crate::engine::modality::PlayerInput;
use crate::model::model_identity::ModelIdentity;
use crate::model::session_state::SessionSnapshot;
use crate::model::turn::GameSummary;

/// Sent by a presentation layer to the engine thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Submit(PlayerInput),
}

/// Sent by the engine to whatever presents the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineResponse {
    Scene {
        scene_index: u32,
        model: ModelIdentity,
        text: String,
    },
    Outcome {
        text: String,
        recovered: bool,
    },
    StateChanged(SessionSnapshot),
    AwaitingInput,
    Notice(String),
    GameOver(GameSummary),
}
