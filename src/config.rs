use std::time::Duration;

use crate::engine::Difficulty;

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Difficulty for new sessions that don't ask for one.
    pub default_difficulty: Difficulty,
    /// Upper bound on one move-suggestion request, in milliseconds.
    pub ai_timeout_ms: u64,
    /// Pause before the AI turn starts, in milliseconds.
    pub ai_move_delay_ms: u64,
    /// LLM provider settings.
    pub llm: LlmConfig,
}

/// Credentials and endpoint for one LLM provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

/// Which move-suggestion service to talk to, and how.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    /// Preferred provider: `gemini`, `openai` or `anthropic`.
    pub provider: String,
    pub gemini: ProviderConfig,
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
}

const PROVIDERS: [&str; 3] = ["gemini", "openai", "anthropic"];

impl LlmConfig {
    pub fn provider_config(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "gemini" => Some(&self.gemini),
            "openai" => Some(&self.openai),
            "anthropic" => Some(&self.anthropic),
            _ => None,
        }
    }

    /// The provider to use: the configured one if it has a key, otherwise the
    /// first provider that does.
    pub fn auto_detect_provider(&self) -> Option<&'static str> {
        let keyed = |name: &str| {
            self.provider_config(name)
                .is_some_and(|cfg| !cfg.api_key.is_empty())
        };
        PROVIDERS
            .iter()
            .copied()
            .find(|name: &&str| *name == self.provider && keyed(*name))
            .or_else(|| PROVIDERS.iter().copied().find(|name: &&str| keyed(*name)))
    }

    fn from_lookup(var: &impl Fn(&str) -> Option<String>) -> Self {
        let provider = |prefix: &str, model: &str, endpoint: &str| ProviderConfig {
            api_key: var(&format!("{prefix}_API_KEY")).unwrap_or_default(),
            model: var(&format!("{prefix}_MODEL")).unwrap_or_else(|| model.to_string()),
            endpoint: var(&format!("{prefix}_ENDPOINT")).unwrap_or_else(|| endpoint.to_string()),
        };

        let mut gemini = provider(
            "GEMINI",
            "gemini-3-flash-preview",
            "https://generativelanguage.googleapis.com/v1beta/models",
        );
        if gemini.api_key.is_empty() {
            gemini.api_key = var("API_KEY").unwrap_or_default();
        }

        LlmConfig {
            enabled: var("CHESS_LLM_ENABLED")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(true),
            provider: var("CHESS_LLM_PROVIDER")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "gemini".to_string()),
            gemini,
            openai: provider(
                "OPENAI",
                "gpt-4o-mini",
                "https://api.openai.com/v1/chat/completions",
            ),
            anthropic: provider(
                "ANTHROPIC",
                "claude-3-5-haiku-latest",
                "https://api.anthropic.com/v1/messages",
            ),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::from_lookup(&|_: &str| None)
    }
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with a custom variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        AppConfig {
            port: var("PORT").and_then(|v| v.parse().ok()).unwrap_or(8082),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            default_difficulty: var("CHESS_AI_DEFAULT_DIFFICULTY")
                .and_then(|v| Difficulty::from_str_loose(&v))
                .unwrap_or_default(),
            ai_timeout_ms: var("CHESS_AI_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            ai_move_delay_ms: var("CHESS_AI_MOVE_DELAY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            llm: LlmConfig::from_lookup(&var),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    pub fn ai_move_delay(&self) -> Duration {
        Duration::from_millis(self.ai_move_delay_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from_lookup(|_: &str| None)
    }
}
