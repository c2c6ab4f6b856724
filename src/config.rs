//! Process-wide configuration.
//!
//! Loaded once before the first turn, then shared behind an `Arc` and never
//! mutated.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::model_identity::{ModelRole, ModelTable};
use crate::model::session_state::{SessionState, DEFAULT_LOCATION, DEFAULT_VITALITY};

const APP_DIR: &str = "dungeon_master";
const CONFIG_FILE: &str = "engine_config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Wire format spoken by the model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum BackendProtocol {
    /// `POST /api/generate`, reply in `response`.
    #[default]
    #[serde(rename = "ollama")]
    #[value(name = "ollama")]
    Ollama,
    /// `POST /v1/chat/completions`, reply in `choices[0].message.content`.
    #[serde(rename = "openai_compatible")]
    #[value(name = "openai_compatible")]
    OpenAiCompatible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub protocol: BackendProtocol,
    /// Transport timeout for one model call.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".into(),
            protocol: BackendProtocol::Ollama,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Temperatures {
    pub narrator: f32,
    pub resolver: f32,
    pub vision: f32,
}

impl Temperatures {
    pub fn for_role(&self, role: ModelRole) -> f32 {
        match role {
            ModelRole::Narrator => self.narrator,
            ModelRole::Resolver => self.resolver,
            ModelRole::Vision => self.vision,
        }
    }
}

impl Default for Temperatures {
    fn default() -> Self {
        Self {
            narrator: 0.7,
            resolver: 0.7,
            vision: 0.7,
        }
    }
}

/// Which resolver handles a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverRouting {
    /// Always the first configured resolver.
    #[default]
    Fixed,
    /// Rotate through the resolvers by scene index.
    Alternate,
}

/// Whether the merge step bounds vitality to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalityPolicy {
    #[default]
    Unclamped,
    Clamped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub vitality: i32,
    pub max_vitality: i32,
    pub location: String,
    pub inventory: Vec<String>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            vitality: DEFAULT_VITALITY,
            max_vitality: DEFAULT_VITALITY,
            location: DEFAULT_LOCATION.into(),
            inventory: Vec::new(),
        }
    }
}

impl SessionDefaults {
    pub fn initial_state(&self) -> SessionState {
        SessionState::new(self.vitality, self.max_vitality, self.location.clone())
            .with_inventory(self.inventory.iter().cloned())
    }
}

/// Opening/closing pair around model deliberation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningMarker {
    pub open: String,
    pub close: String,
}

impl ReasoningMarker {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

pub fn default_reasoning_markers() -> Vec<ReasoningMarker> {
    vec![
        ReasoningMarker::new("<think>", "</think>"),
        ReasoningMarker::new("<thinking>", "</thinking>"),
        ReasoningMarker::new("<reasoning>", "</reasoning>"),
    ]
}

/// OpenAI-compatible speech transcription endpoint (e.g. a local whisper server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gateway: GatewayConfig,
    pub models: ModelTable,
    pub temperatures: Temperatures,
    pub resolver_routing: ResolverRouting,
    pub vitality_policy: VitalityPolicy,
    pub session: SessionDefaults,
    pub reasoning_markers: Vec<ReasoningMarker>,
    pub transcription: Option<TranscriptionConfig>,
    /// Longest image edge sent to the vision model.
    pub vision_max_edge: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            models: ModelTable::default(),
            temperatures: Temperatures::default(),
            resolver_routing: ResolverRouting::default(),
            vitality_policy: VitalityPolicy::default(),
            session: SessionDefaults::default(),
            reasoning_markers: default_reasoning_markers(),
            transcription: None,
            vision_max_edge: 768,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl EngineConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist and parse. Without one, the per-user
    /// config file is used when present and defaults otherwise; a broken
    /// per-user file is reported and replaced by defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "ignoring unreadable config, using defaults");
                    Self::default()
                }),
                _ => Self::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.narrators.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one narrator model is required".into(),
            ));
        }
        if self.models.resolvers.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one resolver model is required".into(),
            ));
        }
        if reqwest::Url::parse(&self.gateway.endpoint).is_err() {
            return Err(ConfigError::Invalid(format!(
                "gateway endpoint '{}' is not a URL",
                self.gateway.endpoint
            )));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.session.max_vitality <= 0 {
            return Err(ConfigError::Invalid("max_vitality must be positive".into()));
        }
        if self
            .reasoning_markers
            .iter()
            .any(|m| m.open.is_empty() || m.close.is_empty())
        {
            return Err(ConfigError::Invalid(
                "reasoning markers must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn protocol_names_match_between_cli_and_file() {
        use clap::ValueEnum;

        for protocol in BackendProtocol::value_variants() {
            let cli_name = protocol
                .to_possible_value()
                .map(|v| v.get_name().to_string())
                .unwrap();
            let file_name = serde_json::to_value(protocol).unwrap();
            assert_eq!(file_name, serde_json::Value::String(cli_name.clone()));
            assert_eq!(BackendProtocol::from_str(&cli_name, false), Ok(*protocol));
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.models.narrators.len(), 2);
        assert_eq!(config.resolver_routing, ResolverRouting::Fixed);
        assert_eq!(config.vitality_policy, VitalityPolicy::Unclamped);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "gateway": {{ "endpoint": "http://localhost:1234/v1/chat/completions", "protocol": "openai_compatible" }},
                "models": {{ "narrators": ["local-model"], "resolvers": ["local-model"] }},
                "vitality_policy": "clamped"
            }}"#
        )
        .unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.gateway.protocol, BackendProtocol::OpenAiCompatible);
        assert_eq!(config.gateway.timeout_secs, 300);
        assert_eq!(config.models.narrators, vec!["local-model".to_string()]);
        assert!(config.models.vision.is_none());
        assert_eq!(config.vitality_policy, VitalityPolicy::Clamped);
        assert_eq!(config.session.location, "starting_point");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = EngineConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_narrator_table_is_rejected() {
        let mut config = EngineConfig::default();
        config.models.narrators.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let mut config = EngineConfig::default();
        config.gateway.endpoint = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn session_defaults_build_initial_state() {
        let defaults = SessionDefaults {
            inventory: vec!["lantern".into()],
            ..SessionDefaults::default()
        };
        let state = defaults.initial_state();
        assert_eq!(state.inventory(), ["lantern".to_string()]);
        assert_eq!(state.vitality(), 100);
    }
}
