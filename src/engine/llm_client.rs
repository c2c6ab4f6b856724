use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{BackendProtocol, EngineConfig};
use crate::model::model_identity::ModelIdentity;

/// Outcome of one model call. Failures are already folded into `Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextResult {
    Text(String),
    Empty,
}

impl TextResult {
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            TextResult::Empty
        } else {
            TextResult::Text(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TextResult::Empty)
    }

    pub fn into_text(self) -> String {
        match self {
            TextResult::Text(text) => text,
            TextResult::Empty => String::new(),
        }
    }
}

/// Uniform synchronous call contract to a named backend model.
pub trait ModelGateway: Send {
    fn invoke(&self, model: &ModelIdentity, prompt: &str) -> TextResult;

    /// Same as `invoke`, with one base64-encoded PNG attached.
    fn invoke_with_image(
        &self,
        model: &ModelIdentity,
        prompt: &str,
        image_base64: &str,
    ) -> TextResult;
}

#[derive(Debug, Error)]
enum GatewayError {
    #[error("no backend model configured for {0}")]
    Unmapped(ModelIdentity),

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response envelope: {0}")]
    Envelope(String),
}

/* =========================
   Ollama wire format
   ========================= */

#[derive(Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<&'a str>,
}

#[derive(Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/* =========================
   OpenAI-compatible wire format
   ========================= */

#[derive(Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: ChatContent,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

fn decode_generate(body: &str) -> Result<String, GatewayError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Envelope(e.to_string()))?;

    parsed
        .response
        .ok_or_else(|| GatewayError::Envelope("missing 'response' field".into()))
}

fn decode_chat_completion(body: &str) -> Result<String, GatewayError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Envelope(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GatewayError::Envelope("no choices in completion".into()))
}

fn chat_request<'a>(
    model: &'a str,
    prompt: &str,
    image: Option<&str>,
    temperature: f32,
) -> ChatCompletionRequest<'a> {
    let content = match image {
        None => ChatContent::Text(prompt.to_string()),
        Some(b64) => ChatContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/png;base64,{b64}"),
                },
            },
        ]),
    };

    ChatCompletionRequest {
        model,
        temperature,
        stream: false,
        messages: vec![ChatMessage {
            role: "user".into(),
            content,
        }],
    }
}

/* =========================
   HTTP gateway
   ========================= */

/// Talks to a local Ollama or LM Studio style server over blocking HTTP.
#[derive(Clone)]
pub struct HttpModelGateway {
    client: Client,
    config: Arc<EngineConfig>,
}

impl HttpModelGateway {
    pub fn new(config: Arc<EngineConfig>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gateway.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn call(
        &self,
        model: &ModelIdentity,
        prompt: &str,
        image: Option<&str>,
    ) -> Result<String, GatewayError> {
        let name = self
            .config
            .models
            .resolve(model)
            .ok_or(GatewayError::Unmapped(*model))?;
        let temperature = self.config.temperatures.for_role(model.role);
        let request = self.client.post(&self.config.gateway.endpoint);

        let request = match self.config.gateway.protocol {
            BackendProtocol::Ollama => request.json(&GenerateRequest {
                model: name,
                prompt,
                stream: false,
                options: GenerateOptions { temperature },
                images: image.into_iter().collect(),
            }),
            BackendProtocol::OpenAiCompatible => {
                request.json(&chat_request(name, prompt, image, temperature))
            }
        };

        let body = request.send()?.error_for_status()?.text()?;

        match self.config.gateway.protocol {
            BackendProtocol::Ollama => decode_generate(&body),
            BackendProtocol::OpenAiCompatible => decode_chat_completion(&body),
        }
    }

    fn dispatch(&self, model: &ModelIdentity, prompt: &str, image: Option<&str>) -> TextResult {
        let started = Instant::now();

        match self.call(model, prompt, image) {
            Ok(text) => {
                tracing::debug!(
                    model = %model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    chars = text.len(),
                    "model replied"
                );
                TextResult::from_text(text)
            }
            Err(e) => {
                tracing::warn!(model = %model, error = %e, "model call failed, treating as empty");
                TextResult::Empty
            }
        }
    }

    /// Checks the backend is reachable by listing its models.
    pub fn probe(&self) -> Result<String> {
        let endpoint = reqwest::Url::parse(&self.config.gateway.endpoint)?;

        let (path, key) = match self.config.gateway.protocol {
            BackendProtocol::Ollama => ("/api/tags", "models"),
            BackendProtocol::OpenAiCompatible => ("/v1/models", "data"),
        };

        let resp: serde_json::Value = self
            .client
            .get(endpoint.join(path)?)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(format!(
            "Connected ({} models available)",
            resp[key].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl ModelGateway for HttpModelGateway {
    fn invoke(&self, model: &ModelIdentity, prompt: &str) -> TextResult {
        self.dispatch(model, prompt, None)
    }

    fn invoke_with_image(
        &self,
        model: &ModelIdentity,
        prompt: &str,
        image_base64: &str,
    ) -> TextResult {
        self.dispatch(model, prompt, Some(image_base64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::model_identity::ModelTable;

    #[test]
    fn generate_envelope_reads_response_field() {
        let text = decode_generate(r#"{"model":"m","response":"A cave.","done":true}"#).unwrap();
        assert_eq!(text, "A cave.");
    }

    #[test]
    fn generate_envelope_without_response_is_rejected() {
        assert!(decode_generate(r#"{"error":"model not found"}"#).is_err());
        assert!(decode_generate("<html>").is_err());
    }

    #[test]
    fn chat_envelope_reads_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}]}"#;
        assert_eq!(decode_chat_completion(body).unwrap(), "Hello");
        assert!(decode_chat_completion(r#"{"choices":[]}"#).is_err());
    }

    #[test]
    fn chat_request_attaches_image_as_data_uri() {
        let req = chat_request("vl", "describe", Some("QUJD"), 0.2);
        let json = serde_json::to_value(&req).unwrap();
        let parts = &json["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,QUJD");

        let plain = serde_json::to_value(chat_request("m", "hi", None, 0.7)).unwrap();
        assert_eq!(plain["messages"][0]["content"], "hi");
    }

    #[test]
    fn generate_request_omits_images_when_absent() {
        let req = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            options: GenerateOptions { temperature: 0.7 },
            images: Vec::new(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("images").is_none());
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn whitespace_reply_is_empty() {
        assert!(TextResult::from_text("  \n".into()).is_empty());
        assert_eq!(TextResult::Empty.into_text(), "");
    }

    #[test]
    fn unreachable_backend_yields_empty() {
        let mut config = EngineConfig::default();
        config.gateway.endpoint = "http://127.0.0.1:1/api/generate".into();
        config.gateway.timeout_secs = 2;
        let gateway = HttpModelGateway::new(Arc::new(config)).unwrap();

        let result = gateway.invoke(&ModelIdentity::narrator(0), "hello");
        assert_eq!(result, TextResult::Empty);
    }

    #[test]
    fn unmapped_identity_yields_empty_without_calling_out() {
        let config = EngineConfig {
            models: ModelTable {
                narrators: vec!["a".into()],
                resolvers: vec!["b".into()],
                vision: None,
            },
            ..EngineConfig::default()
        };
        let gateway = HttpModelGateway::new(Arc::new(config)).unwrap();

        let result = gateway.invoke_with_image(&ModelIdentity::vision(), "look", "AAAA");
        assert!(result.is_empty());
    }
}
