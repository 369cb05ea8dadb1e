use std::collections::HashMap;
use std::sync::Arc;

use compforge_ai::upstream::OpenRouterClient;
use compforge_ai::{GenerationOptions, GenerationService};
use compforge_core::{
    AuthService, GithubProvider, GoogleProvider, MemoryStore, OAuthError, OAuthKind,
    OAuthProvider, Store, TokenIssuer,
};

use crate::config::ServerConfig;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub generation: GenerationService,
    oauth: Arc<HashMap<OAuthKind, Arc<dyn OAuthProvider>>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer, generation: GenerationService) -> Self {
        Self {
            auth: AuthService::new(store.clone(), tokens),
            store,
            generation,
            oauth: Arc::new(HashMap::new()),
        }
    }

    /// Wires the in-memory store, the OpenRouter client and any configured
    /// OAuth providers.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let client = OpenRouterClient::new(config.upstream.clone())?;
        let mut options = GenerationOptions::default();
        if let Some(model) = &config.model {
            options = options.model(model.clone());
        }
        let generation = GenerationService::new(Arc::new(client)).with_options(options);

        let mut state = Self::new(
            Arc::new(MemoryStore::new()),
            TokenIssuer::new(&config.jwt_secret)?,
            generation,
        );
        if let Some(google) = &config.google {
            state = state.with_oauth_provider(Arc::new(GoogleProvider::new(google.clone())));
        }
        if let Some(github) = &config.github {
            state = state.with_oauth_provider(Arc::new(GithubProvider::new(github.clone())));
        }
        Ok(state)
    }

    /// Registers `provider` under its own kind, replacing any previous one.
    pub fn with_oauth_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        let mut providers = (*self.oauth).clone();
        providers.insert(provider.kind(), provider);
        self.oauth = Arc::new(providers);
        self
    }

    pub fn oauth_provider(&self, kind: OAuthKind) -> Result<Arc<dyn OAuthProvider>, OAuthError> {
        self.oauth
            .get(&kind)
            .cloned()
            .ok_or(OAuthError::NotConfigured(kind))
    }
}
