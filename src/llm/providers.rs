use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{LlmConfig, ProviderConfig};

use super::types::{LlmError, LlmRequest};

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A move-suggestion service. Takes a system prompt + user message (and an
/// optional output schema) and returns the raw reply text.
pub trait LlmProvider: Send + Sync {
    /// Send one request and return the reply text.
    fn generate<'a>(
        &'a self,
        request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

    /// Provider name for logging / status reporting.
    fn name(&self) -> &str;
}

fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn read_error_body(provider: &str, resp: reqwest::Response) -> LlmError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    LlmError::ProviderError(format!("{provider} returned {status}: {text}"))
}

// ---------------------------------------------------------------------------
// Gemini provider
// ---------------------------------------------------------------------------

/// Google Gemini `generateContent`, with native JSON schema output.
#[derive(Debug)]
pub struct GeminiProvider {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey("gemini".to_string()));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client: http_client(),
        })
    }

    fn body(request: &LlmRequest) -> GeminiRequest {
        let text = |s: &str| GeminiContent {
            parts: vec![GeminiPart {
                text: s.to_string(),
            }],
        };
        GeminiRequest {
            system_instruction: text(&request.system_prompt),
            contents: vec![text(&request.user_message)],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
            },
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn generate<'a>(
        &'a self,
        request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/{}:generateContent", self.endpoint, self.model);

            let resp = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .header("x-goog-api-key", &self.api_key)
                .json(&Self::body(request))
                .send()
                .await
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(read_error_body("gemini", resp).await);
            }

            let parsed: GeminiResponse = resp
                .json()
                .await
                .map_err(|e| LlmError::ParseError(e.to_string()))?;

            parsed
                .candidates
                .first()
                .and_then(|c| c.content.parts.first())
                .map(|p| p.text.clone())
                .filter(|t| !t.trim().is_empty())
                .ok_or(LlmError::EmptyResponse)
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible provider
// ---------------------------------------------------------------------------

/// Any OpenAI-compatible chat-completions API. A schema switches on JSON mode.
#[derive(Debug)]
pub struct OpenAiCompatible {
    pub provider_name: String,
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiResponseFormat>,
}

#[derive(Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Deserialize, Clone)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

impl OpenAiCompatible {
    pub fn new(provider_name: &str, config: &ProviderConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey(provider_name.to_string()));
        }
        Ok(Self {
            provider_name: provider_name.to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client: http_client(),
        })
    }
}

impl LlmProvider for OpenAiCompatible {
    fn generate<'a>(
        &'a self,
        request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            let body = OpenAiRequest {
                model: self.model.clone(),
                messages: vec![
                    OpenAiMessage {
                        role: "system".to_string(),
                        content: Some(request.system_prompt.clone()),
                    },
                    OpenAiMessage {
                        role: "user".to_string(),
                        content: Some(request.user_message.clone()),
                    },
                ],
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                response_format: request
                    .response_schema
                    .as_ref()
                    .map(|_| OpenAiResponseFormat {
                        kind: "json_object",
                    }),
            };

            let resp = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(read_error_body(&self.provider_name, resp).await);
            }

            let parsed: OpenAiResponse = resp
                .json()
                .await
                .map_err(|e| LlmError::ParseError(e.to_string()))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|t| !t.trim().is_empty())
                .ok_or(LlmError::EmptyResponse)
        })
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}

// ---------------------------------------------------------------------------
// Anthropic provider
// ---------------------------------------------------------------------------

/// Anthropic Messages API. No structured output mode; the prompt asks for
/// JSON and the selector strips whatever prose surrounds it.
#[derive(Debug)]
pub struct AnthropicProvider {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    system: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey("anthropic".to_string()));
        }
        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client: http_client(),
        })
    }
}

impl LlmProvider for AnthropicProvider {
    fn generate<'a>(
        &'a self,
        request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            let body = AnthropicRequest {
                model: self.model.clone(),
                system: request.system_prompt.clone(),
                messages: vec![AnthropicMessage {
                    role: "user".to_string(),
                    content: request.user_message.clone(),
                }],
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            };

            let resp = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(read_error_body("anthropic", resp).await);
            }

            let parsed: AnthropicResponse = resp
                .json()
                .await
                .map_err(|e| LlmError::ParseError(e.to_string()))?;

            parsed
                .content
                .into_iter()
                .map(|c| c.text)
                .find(|t| !t.trim().is_empty())
                .ok_or(LlmError::EmptyResponse)
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create an LLM provider from a provider name and config.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match name {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        "openai" => Ok(Arc::new(OpenAiCompatible::new(name, config)?)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config)?)),
        other => Err(LlmError::UnsupportedProvider(other.to_string())),
    }
}

/// Pick and build the provider described by the LLM configuration.
pub fn provider_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    if !config.enabled {
        return Err(LlmError::Disabled);
    }
    let name = config
        .auto_detect_provider()
        .ok_or_else(|| LlmError::MissingApiKey(config.provider.clone()))?;
    let cfg = config
        .provider_config(name)
        .ok_or_else(|| LlmError::UnsupportedProvider(name.to_string()))?;
    create_provider(name, cfg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(key: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: key.to_string(),
            model: "some-model".to_string(),
            endpoint: "https://example.com".to_string(),
        }
    }

    #[test]
    fn providers_reject_empty_key() {
        assert!(matches!(
            GeminiProvider::new(&cfg("")),
            Err(LlmError::MissingApiKey(_))
        ));
        assert!(OpenAiCompatible::new("openai", &cfg("")).is_err());
        assert!(AnthropicProvider::new(&cfg("")).is_err());
    }

    #[test]
    fn factory_creates_known_providers() {
        assert_eq!(create_provider("gemini", &cfg("k")).unwrap().name(), "gemini");
        assert_eq!(create_provider("openai", &cfg("k")).unwrap().name(), "openai");
        assert_eq!(
            create_provider("anthropic", &cfg("k")).unwrap().name(),
            "anthropic"
        );
    }

    #[test]
    fn factory_rejects_unknown() {
        for name in ["oracle", "deepseek"] {
            assert!(matches!(
                create_provider(name, &cfg("k")),
                Err(LlmError::UnsupportedProvider(_))
            ));
        }
    }

    #[test]
    fn gemini_body_enables_json_mode_with_schema() {
        let req = LlmRequest::new("sys", "user")
            .with_schema(serde_json::json!({"type": "OBJECT"}));
        let body = serde_json::to_value(GeminiProvider::body(&req)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "user");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn gemini_body_plain_text_without_schema() {
        let body = serde_json::to_value(GeminiProvider::body(&LlmRequest::new("s", "u"))).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn provider_from_config_requires_enabled_and_key() {
        let mut config = LlmConfig::default();
        assert!(matches!(
            provider_from_config(&config),
            Err(LlmError::MissingApiKey(_))
        ));

        config.anthropic.api_key = "sk-ant".to_string();
        assert_eq!(provider_from_config(&config).unwrap().name(), "anthropic");

        config.enabled = false;
        assert!(matches!(
            provider_from_config(&config),
            Err(LlmError::Disabled)
        ));
    }
}
