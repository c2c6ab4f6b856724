use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;

use crate::config::{EngineConfig, TranscriptionConfig};
use crate::engine::llm_client::ModelGateway;
use crate::engine::response_parser::ResponseParser;
use crate::model::model_identity::ModelIdentity;

const IMAGE_PROMPT: &str = "You are helping a player of a text adventure. \
Describe what this image shows in one or two sentences, phrased as the action \
the player takes in the current scene. Reply with the action only.";

/// One line of player input, before any modality conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
    Text(String),
    Voice(String),
    Image(String),
    Quit,
}

impl PlayerInput {
    /// `quit` or `/quit` ends the game, `/voice <path>` and `/image <path>`
    /// attach a recording or a picture; anything else is a plain action.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();

        let Some(command) = trimmed.strip_prefix('/') else {
            return if trimmed.eq_ignore_ascii_case("quit") {
                PlayerInput::Quit
            } else {
                PlayerInput::Text(trimmed.to_string())
            };
        };

        let (head, locator) = command
            .split_once(char::is_whitespace)
            .unwrap_or((command, ""));
        let locator = locator.trim().to_string();

        match head.to_ascii_lowercase().as_str() {
            "quit" => PlayerInput::Quit,
            "voice" => PlayerInput::Voice(locator),
            "image" => PlayerInput::Image(locator),
            _ => PlayerInput::Text(trimmed.to_string()),
        }
    }
}

/// Converts non-text player input into plain text.
/// Both conversions return an empty string on failure.
pub trait ModalityAdapter: Send {
    fn speech_to_text(&self, locator: &str) -> String;
    fn image_to_text(&self, locator: &str) -> String;
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Uses the vision model for pictures and a whisper-style HTTP endpoint for
/// recordings.
pub struct LocalModalityAdapter {
    gateway: Box<dyn ModelGateway>,
    parser: ResponseParser,
    http: Client,
    timeout: Duration,
    transcription: Option<TranscriptionConfig>,
    max_edge: u32,
}

impl LocalModalityAdapter {
    pub fn new(config: &EngineConfig, gateway: Box<dyn ModelGateway>) -> Result<Self> {
        // Transcription is a model call too; it gets the same budget.
        let timeout = Duration::from_secs(config.gateway.timeout_secs);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            gateway,
            parser: ResponseParser::new(config.reasoning_markers.clone()),
            http,
            timeout,
            transcription: config.transcription.clone(),
            max_edge: config.vision_max_edge.max(1),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transcribe(&self, locator: &str) -> Result<String> {
        let cfg = self
            .transcription
            .as_ref()
            .context("no transcription endpoint configured")?;

        let form = multipart::Form::new()
            .text("model", cfg.model.clone())
            .file("file", locator)
            .with_context(|| format!("failed to read recording {locator}"))?;

        let resp: TranscriptionResponse = self
            .http
            .post(&cfg.endpoint)
            .multipart(form)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(resp.text.trim().to_string())
    }
}

/// Loads an image, shrinks it to `max_edge`, and returns it as base64 PNG.
pub fn encode_image(path: &Path, max_edge: u32) -> Result<String> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?;

    let img = if img.width() > max_edge || img.height() > max_edge {
        img.thumbnail(max_edge, max_edge)
    } else {
        img
    };

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    Ok(STANDARD.encode(bytes))
}

impl ModalityAdapter for LocalModalityAdapter {
    fn speech_to_text(&self, locator: &str) -> String {
        match self.transcribe(locator) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(locator, error = %e, "speech transcription failed");
                String::new()
            }
        }
    }

    fn image_to_text(&self, locator: &str) -> String {
        let encoded = match encode_image(Path::new(locator), self.max_edge) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(locator, error = %e, "image conversion failed");
                return String::new();
            }
        };

        let reply = self
            .gateway
            .invoke_with_image(&ModelIdentity::vision(), IMAGE_PROMPT, &encoded);

        self.parser.clean(&reply.into_text())
    }
}
