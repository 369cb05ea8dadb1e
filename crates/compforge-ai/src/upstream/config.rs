use std::time::Duration;

use crate::errors::UpstreamError;

/// Immutable configuration of the upstream chat API.
///
/// Built once at process start and handed to [`super::OpenRouterClient`].
#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    /// API key used for bearer auth.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API, without `/chat/completions`.
    pub base_url: String,
    /// Value of the `HTTP-Referer` attribution header.
    pub referer: String,
    /// Value of the `X-Title` attribution header.
    pub title: String,
    /// Optional HTTP timeout. `None` keeps reqwest's defaults.
    pub timeout: Option<Duration>,
}

impl UpstreamConfig {
    /// Creates a config with OpenRouter defaults and a provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            referer: "https://compforge.app".to_string(),
            title: "CompForge".to_string(),
            timeout: None,
        }
    }

    /// Builds a config from `OPENROUTER_API_KEY`, honouring
    /// `OPENROUTER_BASE_URL` when set.
    pub fn from_env() -> Result<Self, UpstreamError> {
        let api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(UpstreamError::config(
                "missing OPENROUTER_API_KEY for the upstream chat API",
            ));
        }
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENROUTER_BASE_URL")
            && !base_url.trim().is_empty()
        {
            config = config.base_url(base_url.trim());
        }
        Ok(config)
    }

    /// Overrides the API base URL (for proxies or test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the attribution headers.
    pub fn attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    /// Sets an HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
