use serde_json::Value;

/// One prompt sent to a provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: String,
    pub user_message: String,
    /// JSON schema the reply must follow. Providers with a native structured
    /// output mode enforce it; the rest rely on the prompt.
    pub response_schema: Option<Value>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
            response_schema: None,
            max_tokens: 300,
            temperature: 0.7,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Errors that can occur when talking to an LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM move suggestions are disabled")]
    Disabled,

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("no API key configured for provider: {0}")]
    MissingApiKey(String),

    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM request timed out after {0} ms")]
    Timeout(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req = LlmRequest::new("sys", "user");
        assert_eq!(req.system_prompt, "sys");
        assert_eq!(req.user_message, "user");
        assert!(req.response_schema.is_none());
        assert_eq!(req.max_tokens, 300);
    }

    #[test]
    fn with_schema_sets_schema() {
        let req = LlmRequest::new("s", "u").with_schema(serde_json::json!({"type": "OBJECT"}));
        assert_eq!(req.response_schema.unwrap()["type"], "OBJECT");
    }

    #[test]
    fn timeout_message_mentions_duration() {
        assert_eq!(
            LlmError::Timeout(5000).to_string(),
            "LLM request timed out after 5000 ms"
        );
    }
}
