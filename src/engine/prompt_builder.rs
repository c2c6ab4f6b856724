use crate::model::session_state::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptIntent {
    SceneGeneration,
    ChoiceResolution,
}

/// Builds the prompts sent to the models.
/// This struct is intentionally dumb: it only formats text.
/// No parsing, no networking, no engine logic.
///
/// The instruction text is what `response_parser` expects the models to
/// answer to; keep the two in step.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn compose(intent: PromptIntent, state: &SessionState, input_text: &str) -> String {
        match intent {
            PromptIntent::SceneGeneration => ScenePromptBuilder::build(state, input_text),
            PromptIntent::ChoiceResolution => ResolutionPromptBuilder::build(state, input_text),
        }
    }
}

/// Human turn used when asking for the next scene.
pub const NEXT_SCENE_REQUEST: &str = "Generate next scene";

struct ScenePromptBuilder;

impl ScenePromptBuilder {
    fn build(state: &SessionState, input_text: &str) -> String {
        let mut prompt = String::new();

        push_scene_system_prompt(&mut prompt);
        push_player_state(&mut prompt, state);
        push_line(&mut prompt, "Current Scene", &state.scene_index().to_string());
        push_line(&mut prompt, "Previous Action", state.last_outcome());
        prompt.push('\n');
        push_human_turn(&mut prompt, input_text);

        prompt
    }
}

struct ResolutionPromptBuilder;

impl ResolutionPromptBuilder {
    fn build(state: &SessionState, input_text: &str) -> String {
        let mut prompt = String::new();

        push_line(&mut prompt, "Player choice", input_text);
        prompt.push_str("Update game state considering:\n");
        prompt.push_str(&format!("- Current location: {}\n", state.location()));
        prompt.push_str(&format!("- Inventory: {}\n", format_inventory(state.inventory())));
        prompt.push_str(&format!("- Health: {}\n", state.vitality()));
        prompt.push('\n');
        push_player_state(&mut prompt, state);
        push_resolution_contract(&mut prompt);

        prompt
    }
}

fn push_scene_system_prompt(prompt: &mut String) {
    prompt.push_str(
        "System: You are a game master. Create an interactive scene based on the state below.\n\
Respond with a 2-3 paragraph scene description ending with exactly 3 numbered choices.\n\
Do not include your deliberation, notes, or any meta-commentary.\n\n",
    );
}

fn push_resolution_contract(prompt: &mut String) {
    prompt.push_str(
        "\nRespond with a single JSON object and nothing else:\n\
{\"state_update\": {\"health\": <integer>, \"inventory\": [<string>, ...], \"location\": <string>}, \
\"outcome_description\": <string>}\n\
- state_update: only the fields that changed.\n\
- outcome_description: one short paragraph describing what happened.\n",
    );
}

fn push_player_state(prompt: &mut String, state: &SessionState) {
    let snapshot = serde_json::to_string(&state.snapshot()).unwrap_or_else(|_| "{}".to_string());
    push_line(prompt, "Player State", &snapshot);
}

fn push_human_turn(prompt: &mut String, input_text: &str) {
    let text = if input_text.trim().is_empty() {
        NEXT_SCENE_REQUEST
    } else {
        input_text
    };
    push_line(prompt, "Human", text);
}

fn push_line(prompt: &mut String, label: &str, value: &str) {
    prompt.push_str(label);
    prompt.push_str(": ");
    prompt.push_str(value);
    prompt.push('\n');
}

fn format_inventory(items: &[String]) -> String {
    if items.is_empty() {
        "(empty)".to_string()
    } else {
        items.join(", ")
    }
}
