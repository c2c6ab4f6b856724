use serde::{Deserialize, Serialize};

pub const DEFAULT_VITALITY: i32 = 100;
pub const DEFAULT_LOCATION: &str = "starting_point";

/// The single mutable record a game session runs on.
///
/// Fields are crate-private: outside of construction the only writer is
/// `engine::apply_delta`, which keeps a turn's update atomic with respect
/// to the next prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) scene_index: u32,
    pub(crate) vitality: i32,
    pub(crate) max_vitality: i32,
    pub(crate) inventory: Vec<String>,
    pub(crate) location: String,
    pub(crate) last_outcome: String,
}

/// Read-only view of the session sent to models and to the UI.
///
/// Vitality is exposed as `health`, the word the prompts use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub scene_index: u32,
    pub health: i32,
    pub max_health: i32,
    pub inventory: Vec<String>,
    pub location: String,
    pub last_outcome: String,
}

impl SessionState {
    pub fn new(vitality: i32, max_vitality: i32, location: impl Into<String>) -> Self {
        Self {
            scene_index: 0,
            vitality,
            max_vitality,
            inventory: Vec::new(),
            location: location.into(),
            last_outcome: String::new(),
        }
    }

    pub fn with_inventory<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inventory = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn scene_index(&self) -> u32 {
        self.scene_index
    }

    pub fn vitality(&self) -> i32 {
        self.vitality
    }

    pub fn max_vitality(&self) -> i32 {
        self.max_vitality
    }

    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn last_outcome(&self) -> &str {
        &self.last_outcome
    }

    /// The loop ends once vitality reaches zero or below.
    pub fn is_depleted(&self) -> bool {
        self.vitality <= 0
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(self)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_VITALITY, DEFAULT_VITALITY, DEFAULT_LOCATION)
    }
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        SessionSnapshot {
            scene_index: state.scene_index,
            health: state.vitality,
            max_health: state.max_vitality,
            inventory: state.inventory.clone(),
            location: state.location.clone(),
            last_outcome: state.last_outcome.clone(),
        }
    }
}
