use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::apply_delta::apply_delta;
use crate::engine::frontend::Frontend;
use crate::engine::llm_client::ModelGateway;
use crate::engine::modality::{ModalityAdapter, PlayerInput};
use crate::engine::prompt_builder::{PromptBuilder, PromptIntent};
use crate::engine::protocol::EngineResponse;
use crate::engine::response_parser::ResponseParser;
use crate::engine::routing::ModelRouter;
use crate::model::model_identity::ModelIdentity;
use crate::model::session_state::SessionState;
use crate::model::state_delta::Resolution;
use crate::model::turn::{GameSummary, TerminationReason};

/// Where the turn loop currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingScene,
    PresentingScene { model: ModelIdentity, text: String },
    AwaitingInput,
    ResolvingChoice(String),
    ApplyingDelta(Resolution),
    Terminated(TerminationReason),
}

/// One model exchange. Logged, then dropped.
#[derive(Debug)]
struct TurnRecord<'a> {
    prompt: &'a str,
    model: ModelIdentity,
    raw_response: &'a str,
    resolution: Option<&'a Resolution>,
}

impl TurnRecord<'_> {
    fn log(&self) {
        tracing::debug!(
            model = %self.model,
            prompt_chars = self.prompt.len(),
            response_chars = self.raw_response.len(),
            fallback = self.resolution.map(Resolution::is_fallback),
            "turn record"
        );
        tracing::trace!(prompt = self.prompt, response = self.raw_response);
    }
}

/// Drives the game: composer → gateway → parser → merge, one phase per step.
///
/// Owns the session state outright; nothing else holds a reference to it
/// while a turn is in flight.
pub struct Engine {
    config: Arc<EngineConfig>,
    gateway: Box<dyn ModelGateway>,
    modality: Box<dyn ModalityAdapter>,
    parser: ResponseParser,
    router: ModelRouter,
    state: SessionState,
    phase: TurnPhase,
}

impl Engine {
    pub fn new(
        config: Arc<EngineConfig>,
        gateway: Box<dyn ModelGateway>,
        modality: Box<dyn ModalityAdapter>,
    ) -> Self {
        let state = config.session.initial_state();
        let parser = ResponseParser::new(config.reasoning_markers.clone());
        let router = ModelRouter::new(&config.models, config.resolver_routing);

        Self {
            phase: Self::opening_phase(&state),
            config,
            gateway,
            modality,
            parser,
            router,
            state,
        }
    }

    /// Replaces the starting state. Only meaningful before the first step.
    pub fn with_state(mut self, state: SessionState) -> Self {
        self.phase = Self::opening_phase(&state);
        self.state = state;
        self
    }

    fn opening_phase(state: &SessionState) -> TurnPhase {
        if state.is_depleted() {
            TurnPhase::Terminated(TerminationReason::VitalityDepleted)
        } else {
            TurnPhase::AwaitingScene
        }
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.phase, TurnPhase::Terminated(_))
    }

    /// Runs until the player quits or vitality runs out.
    pub fn run(&mut self, frontend: &mut dyn Frontend) -> GameSummary {
        tracing::info!(
            narrators = self.config.models.narrators.len(),
            vitality = self.state.vitality(),
            "game started"
        );

        frontend.present(EngineResponse::StateChanged(self.state.snapshot()));

        while !self.is_terminated() {
            self.step(frontend);
        }

        let summary = self.summary();
        tracing::info!(
            reason = ?summary.reason,
            scenes = summary.scenes_completed,
            "game over"
        );
        frontend.present(EngineResponse::GameOver(summary.clone()));
        summary
    }

    /// Performs exactly one phase transition.
    pub fn step(&mut self, frontend: &mut dyn Frontend) {
        let phase = std::mem::replace(&mut self.phase, TurnPhase::AwaitingScene);

        self.phase = match phase {
            TurnPhase::AwaitingScene => self.generate_scene(),

            TurnPhase::PresentingScene { model, text } => {
                frontend.present(EngineResponse::Scene {
                    scene_index: self.state.scene_index(),
                    model,
                    text,
                });
                TurnPhase::AwaitingInput
            }

            TurnPhase::AwaitingInput => {
                frontend.present(EngineResponse::AwaitingInput);
                self.collect_input(frontend)
            }

            TurnPhase::ResolvingChoice(action) => {
                TurnPhase::ApplyingDelta(self.resolve_choice(&action))
            }

            TurnPhase::ApplyingDelta(resolution) => self.apply(resolution, frontend),

            terminated @ TurnPhase::Terminated(_) => terminated,
        };
    }

    fn generate_scene(&mut self) -> TurnPhase {
        let model = self.router.scene_model(self.state.scene_index());
        let prompt = PromptBuilder::compose(PromptIntent::SceneGeneration, &self.state, "");

        let raw = self.gateway.invoke(&model, &prompt).into_text();
        if raw.is_empty() {
            tracing::warn!(model = %model, scene = self.state.scene_index(), "empty scene");
        }

        TurnRecord {
            prompt: &prompt,
            model,
            raw_response: &raw,
            resolution: None,
        }
        .log();

        TurnPhase::PresentingScene {
            model,
            text: self.parser.clean(&raw),
        }
    }

    fn collect_input(&mut self, frontend: &mut dyn Frontend) -> TurnPhase {
        let action = match frontend.next_input() {
            PlayerInput::Quit => return TurnPhase::Terminated(TerminationReason::PlayerQuit),
            PlayerInput::Text(text) => text,
            PlayerInput::Voice(locator) => {
                let text = self.modality.speech_to_text(&locator);
                frontend.present(EngineResponse::Notice(heard("voice", &text)));
                text
            }
            PlayerInput::Image(locator) => {
                let text = self.modality.image_to_text(&locator);
                frontend.present(EngineResponse::Notice(heard("image", &text)));
                text
            }
        };

        TurnPhase::ResolvingChoice(action)
    }

    fn resolve_choice(&mut self, action: &str) -> Resolution {
        let model = self.router.resolution_model(self.state.scene_index());
        let prompt = PromptBuilder::compose(PromptIntent::ChoiceResolution, &self.state, action);

        let raw = self.gateway.invoke(&model, &prompt).into_text();
        let resolution = self.parser.parse(&raw);

        if resolution.is_fallback() {
            tracing::warn!(model = %model, "resolver reply unusable, story stumbles");
        }

        TurnRecord {
            prompt: &prompt,
            model,
            raw_response: &raw,
            resolution: Some(&resolution),
        }
        .log();

        resolution
    }

    fn apply(&mut self, resolution: Resolution, frontend: &mut dyn Frontend) -> TurnPhase {
        let report = apply_delta(&mut self.state, &resolution, self.config.vitality_policy);

        frontend.present(EngineResponse::Outcome {
            text: resolution.outcome().to_string(),
            recovered: report.recovered,
        });
        frontend.present(EngineResponse::StateChanged(self.state.snapshot()));

        if self.state.is_depleted() {
            TurnPhase::Terminated(TerminationReason::VitalityDepleted)
        } else {
            TurnPhase::AwaitingScene
        }
    }

    pub fn summary(&self) -> GameSummary {
        let reason = match self.phase {
            TurnPhase::Terminated(reason) => reason,
            _ if self.state.is_depleted() => TerminationReason::VitalityDepleted,
            _ => TerminationReason::PlayerQuit,
        };

        GameSummary {
            reason,
            scenes_completed: self.state.scene_index(),
            final_state: self.state.snapshot(),
        }
    }
}

fn heard(kind: &str, text: &str) -> String {
    if text.is_empty() {
        format!("the {kind} input could not be understood")
    } else {
        format!("{kind}: {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::llm_client::TextResult;
    use std::collections::VecDeque;

    struct CannedGateway;

    impl ModelGateway for CannedGateway {
        fn invoke(&self, model: &ModelIdentity, _prompt: &str) -> TextResult {
            match model.role {
                crate::model::model_identity::ModelRole::Narrator => {
                    TextResult::Text("<think>x</think>A corridor.".into())
                }
                _ => TextResult::Text(
                    r#"{"state_update":{"location":"corridor"},"outcome_description":"You walk."}"#
                        .into(),
                ),
            }
        }

        fn invoke_with_image(&self, model: &ModelIdentity, prompt: &str, _: &str) -> TextResult {
            self.invoke(model, prompt)
        }
    }

    struct NoModality;

    impl ModalityAdapter for NoModality {
        fn speech_to_text(&self, _: &str) -> String {
            String::new()
        }

        fn image_to_text(&self, _: &str) -> String {
            String::new()
        }
    }

    #[derive(Default)]
    struct Script {
        inputs: VecDeque<PlayerInput>,
        seen: Vec<EngineResponse>,
    }

    impl Frontend for Script {
        fn present(&mut self, response: EngineResponse) {
            self.seen.push(response);
        }

        fn next_input(&mut self) -> PlayerInput {
            self.inputs.pop_front().unwrap_or(PlayerInput::Quit)
        }
    }

    fn engine() -> Engine {
        Engine::new(
            Arc::new(EngineConfig::default()),
            Box::new(CannedGateway),
            Box::new(NoModality),
        )
    }

    #[test]
    fn steps_through_every_phase_in_order() {
        let mut engine = engine();
        let mut ui = Script {
            inputs: VecDeque::from([PlayerInput::Text("1".into())]),
            ..Script::default()
        };

        assert_eq!(engine.phase(), &TurnPhase::AwaitingScene);

        engine.step(&mut ui);
        assert_eq!(
            engine.phase(),
            &TurnPhase::PresentingScene {
                model: ModelIdentity::narrator(0),
                text: "A corridor.".into(),
            }
        );

        engine.step(&mut ui);
        assert_eq!(engine.phase(), &TurnPhase::AwaitingInput);

        engine.step(&mut ui);
        assert_eq!(engine.phase(), &TurnPhase::ResolvingChoice("1".into()));

        engine.step(&mut ui);
        assert!(matches!(engine.phase(), TurnPhase::ApplyingDelta(_)));
        assert_eq!(engine.state().location(), "starting_point");

        engine.step(&mut ui);
        assert_eq!(engine.phase(), &TurnPhase::AwaitingScene);
        assert_eq!(engine.state().location(), "corridor");
        assert_eq!(engine.state().scene_index(), 1);
    }

    #[test]
    fn quit_terminates_from_awaiting_input() {
        let mut engine = engine();
        let mut ui = Script::default();

        engine.step(&mut ui);
        engine.step(&mut ui);
        engine.step(&mut ui);

        assert_eq!(
            engine.phase(),
            &TurnPhase::Terminated(TerminationReason::PlayerQuit)
        );
        assert_eq!(engine.summary().scenes_completed, 0);
    }

    #[test]
    fn terminated_is_absorbing() {
        let mut engine = engine().with_state(SessionState::new(0, 100, "grave"));
        let mut ui = Script::default();

        engine.step(&mut ui);
        engine.step(&mut ui);

        assert_eq!(
            engine.phase(),
            &TurnPhase::Terminated(TerminationReason::VitalityDepleted)
        );
        assert!(ui.seen.is_empty());
    }

    #[test]
    fn failed_conversion_reports_and_continues() {
        let mut engine = engine();
        let mut ui = Script {
            inputs: VecDeque::from([PlayerInput::Voice("missing.wav".into())]),
            ..Script::default()
        };

        for _ in 0..3 {
            engine.step(&mut ui);
        }

        assert_eq!(engine.phase(), &TurnPhase::ResolvingChoice(String::new()));
        assert!(ui.seen.iter().any(|r| matches!(
            r,
            EngineResponse::Notice(text) if text.contains("could not be understood")
        )));
    }
}
