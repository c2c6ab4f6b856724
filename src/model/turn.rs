use serde::{Deserialize, Serialize};

use crate::model::session_state::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    PlayerQuit,
    VitalityDepleted,
}

/// Emitted once when the loop exits; rendering it is up to the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub reason: TerminationReason,
    pub scenes_completed: u32,
    pub final_state: SessionSnapshot,
}
